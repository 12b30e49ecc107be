// Declare modules
pub mod event;
pub mod field_map;
pub mod upload;

pub use event::{EventRecord, NOT_AVAILABLE, NO_TITLE};
pub use field_map::FieldMap;
pub use upload::{UploadMessage, UploadReceipt, UploadStatus};
