pub mod apps;
pub mod simctl;
pub mod toolchain;

use thiserror::Error;

/// Ways the text printed by Apple's tools can fail to make sense.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("The command produced no output to parse.")]
    EmptyInput,
    #[error("The output wasn't valid JSON of the expected shape: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    #[error("The output didn't have the expected format: {0:?}")]
    UnexpectedFormat(String),
}
