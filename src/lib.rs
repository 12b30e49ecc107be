// icsvault library
// Parses uploaded ICS files into event records and keeps them in an
// ephemeral store until the client fetches or discards them

pub mod calendar;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod upload;
pub mod utils;

// Re-export commonly used types
pub use calendar::{parse_ics, parse_ics_str, ParseResult};
pub use config::{validate_config, StoreConfig, VaultConfig};
pub use error::{AppError, AppResult, ParseError, ParseErrorKind, StoreError};
pub use models::{EventRecord, FieldMap, UploadMessage, UploadReceipt, UploadStatus, NOT_AVAILABLE, NO_TITLE};
pub use store::{EntryId, EphemeralStore, RetentionPolicy};
pub use upload::IcsUploadService;
