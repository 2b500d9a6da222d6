pub mod backend;
pub mod webdriver;

pub use backend::WebDriverSession;
