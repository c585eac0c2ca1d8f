use std::result;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Generation error: {0}")]
    Generation(String),
}

impl Error {
    pub fn generation(message: impl Into<String>) -> Self {
        Error::Generation(message.into())
    }
}

pub type Result<T> = result::Result<T, Error>;
