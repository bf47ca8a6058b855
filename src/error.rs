use thiserror::Error;

#[derive(Error, Debug)]
pub enum CqError {
    #[error("Invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: &'static str },
    #[error("One or more messages can not be combined")]
    NotComposable,
    #[error("Malformed segment {record}: {source}")]
    MalformedSegment {
        record: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Malformed event {record}: {source}")]
    MalformedEvent {
        record: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Malformed markup at byte {position}: {reason}")]
    MalformedMarkup { position: usize, reason: &'static str },
    #[error("Serde Error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T, E = CqError> = std::result::Result<T, E>;

impl CqError {
    pub(crate) fn malformed(record: &serde_json::Value, source: serde_json::Error) -> Self {
        log::debug!("failed to decode segment {record}: {source}");
        CqError::MalformedSegment {
            record: record.to_string(),
            source,
        }
    }
}
