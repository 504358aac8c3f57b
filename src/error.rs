use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrackError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mismatch lengths. Left string has {left} bytes but right string has {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Index {index} out of range for a byte string of {len} bytes")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("Cannot build an infinite stream from an empty byte string")]
    EmptySource,

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Sequences have different length: first sequence has {expected} bytes but sequence {index} has {found}")]
    RaggedBlocks {
        expected: usize,
        index: usize,
        found: usize,
    },

    #[error("The guess set is empty")]
    EmptyGuess,

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("The score of {candidate} is {score:.4} but it must be a value between 0 and 1")]
    InvalidScore { candidate: String, score: f64 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Bad padding: {0}")]
    Padding(String),
}

pub type Result<T> = std::result::Result<T, CrackError>;
