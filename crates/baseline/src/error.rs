use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty response")]
    Empty,
    #[error("invalid status line: {0}")]
    StatusLine(String),
    #[error("invalid status code: {0}")]
    StatusCode(String),
}
