pub mod advisor;
pub mod config;
pub mod download;
pub mod error;
pub mod http;
pub mod log;
pub mod resolver;
pub mod scrape;
pub mod selection;
pub mod session;
pub mod srcset;

pub use config::{ConfigError, ConfigLoader, ScrapeConfig};
pub use error::ScrapeError;
pub use http::{FetchError, HttpFetcher, ReqwestFetcher};
pub use log::{LogLevel, LogRecord, LogSink};
pub use scrape::{DownloadOutcome, Summary, scrape};
pub use session::{BrowserSession, ElementHandle, SessionError};
