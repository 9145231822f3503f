use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse Lighthouse payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid store layout: {0}")]
    InvalidStore(String),

    #[error("Input file error: {0}")]
    Input(String),
}

pub type Result<T> = std::result::Result<T, Error>;
