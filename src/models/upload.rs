// file: src/models/upload.rs
use super::EventRecord;
use crate::store::EntryId;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadStatus {
    Success,
    Error,
}

/// User-facing texts for upload responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMessage {
    TooLarge,
    NotAnIcs,
    IcsUploadSuccess,
}

impl UploadMessage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TooLarge => {
                "Your file size exceeds our 5 MB limit. Please try uploading a different file."
            }
            Self::NotAnIcs => "Invalid file type. Only ICS files are allowed.",
            Self::IcsUploadSuccess => "Ics file uploaded successfully.",
        }
    }
}

impl Serialize for UploadMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// What a successful upload hands back: the id to fetch the stored
/// payload with, plus the parsed events themselves.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub uid: EntryId,
    pub message: UploadMessage,
    pub status: UploadStatus,
    pub events: Vec<EventRecord>,
    /// `events` rendered as pretty-printed JSON.
    pub json: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_as_text() {
        let json = serde_json::to_string(&UploadMessage::IcsUploadSuccess).unwrap();
        assert_eq!(json, r#""Ics file uploaded successfully.""#);
        assert_eq!(serde_json::to_string(&UploadStatus::Error).unwrap(), r#""Error""#);
    }
}
