pub mod config;
pub mod date;
pub mod error;
pub mod types;

pub use config::parse_blog_toml;
pub use date::{MONTHS_PT_BR, format_date};
pub use error::{Error, Result};
pub use types::*;
