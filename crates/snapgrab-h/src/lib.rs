pub mod backend;
pub mod cdp;
pub mod element;

pub use backend::HeadlessSession;
