use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlackjackError {
    #[error("Invalid card notation: {0}")]
    InvalidCardNotation(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Need at least {batch_size} examples for one batch, got {got}")]
    InsufficientExamples { batch_size: usize, got: usize },

    #[error("Network has not been initialized")]
    NetworkNotInitialized,

    #[error("Arithmetic overflow in activation for input {0}")]
    ArithmeticOverflow(f64),

    #[error("Episode tree invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Shoe exhausted")]
    ShoeExhausted,

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type BlackjackResult<T> = Result<T, BlackjackError>;
