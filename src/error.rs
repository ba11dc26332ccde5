use crate::mapping::{AnalogInput, MappingId, StickSide};
use std::path::PathBuf;
use thiserror::Error;

/// Failures from the mapping store and its on-disk copy.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no button mapping with id {0}")]
    UnknownMapping(MappingId),

    #[error("no {input} analog mapping for the {axis} stick")]
    UnknownAnalog { input: AnalogInput, axis: StickSide },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    Format(#[from] serde_json::Error),
}
