// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

use crate::core::event::{StreamId, Timestamp};
use crate::core::format::FormatError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Unknown stream: {0}")]
    UnknownStream(StreamId),

    #[error("Stream already admitted: {0}")]
    StreamAlreadyAdmitted(StreamId),

    #[error("Bad start offset for stream {stream}: {offset}")]
    BadStartOffset { stream: StreamId, offset: Timestamp },

    #[error("Bad frame timestamp for stream {stream}: {pts}")]
    BadTimestamp { stream: StreamId, pts: Timestamp },

    #[error("Event pushed after end of stream on stream {0}")]
    EventAfterEndOfStream(StreamId),

    #[error("Invalid format: {0}")]
    Format(#[from] FormatError),

    #[error("Engine already emitted end of stream")]
    Terminated,

    #[error("Compositor failed on tick {index} (pts {pts}): {source}")]
    Compositor {
        index: u64,
        pts: Timestamp,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Engine runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SyncError {
    /// Caller pushed something the engine must reject. The engine state is
    /// untouched when one of these is returned.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            SyncError::UnknownStream(_)
                | SyncError::StreamAlreadyAdmitted(_)
                | SyncError::BadStartOffset { .. }
                | SyncError::BadTimestamp { .. }
                | SyncError::EventAfterEndOfStream(_)
                | SyncError::Format(_)
                | SyncError::Terminated
        )
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violation_classification() {
        assert!(SyncError::UnknownStream(StreamId(3)).is_contract_violation());
        assert!(SyncError::EventAfterEndOfStream(StreamId(1)).is_contract_violation());
        assert!(
            SyncError::BadStartOffset {
                stream: StreamId(1),
                offset: -5
            }
            .is_contract_violation()
        );
        assert!(SyncError::Format(FormatError::BadFramerate).is_contract_violation());

        let compositor = SyncError::Compositor {
            index: 0,
            pts: 0,
            source: anyhow::anyhow!("gpu lost"),
        };
        assert!(!compositor.is_contract_violation());
        assert!(!SyncError::Runtime("closed".into()).is_contract_violation());
    }

    #[test]
    fn test_error_messages_name_the_stream() {
        let err = SyncError::BadStartOffset {
            stream: StreamId(7),
            offset: -1,
        };
        assert_eq!(err.to_string(), "Bad start offset for stream 7: -1");

        let err = SyncError::EventAfterEndOfStream(StreamId(2));
        assert!(err.to_string().contains("stream 2"));
    }
}
