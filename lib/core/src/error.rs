use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loaded,
    Normalized,
    Indexed,
    Retrieved,
    Scored,
    Filtered,
    Reported,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Loaded => "loaded",
            Stage::Normalized => "normalized",
            Stage::Indexed => "indexed",
            Stage::Retrieved => "retrieved",
            Stage::Scored => "scored",
            Stage::Filtered => "filtered",
            Stage::Reported => "reported",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Input format error: {0}")]
    InputFormat(String),

    #[error("Vectorization failed: {0}")]
    Vectorization(String),

    #[error("Candidate retrieval failed: {0}")]
    Retrieval(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid normalization pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attribute this error to a pipeline stage. Already attributed errors keep their stage.
    pub fn at(self, stage: Stage) -> Self {
        match self {
            e @ Error::Stage { .. } => e,
            other => Error::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage this error was attributed to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_attribution_is_sticky() {
        let err = Error::Retrieval("nan score".to_string())
            .at(Stage::Retrieved)
            .at(Stage::Reported);
        assert_eq!(err.stage(), Some(Stage::Retrieved));
        assert!(err.to_string().contains("'retrieved'"));
        assert!(err.to_string().contains("nan score"));
    }
}
