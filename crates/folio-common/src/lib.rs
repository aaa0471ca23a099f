//! Shared plumbing for folio: configuration, error types, the content source
//! client and tracing setup.

pub mod config;
pub mod error;
pub mod source;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use crate::config::{NotionConfig, SiteConfig, load_dotenv};
pub use crate::error::{ConfigError, SourceError};
pub use crate::source::NotionClient;
