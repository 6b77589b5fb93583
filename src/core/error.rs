use std::io;

#[derive(thiserror::Error, Debug)]
pub enum LensError {
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout")]
    Timeout,
    #[error("http error: {0}")]
    Http(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("unknown error")]
    Unknown,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<reqwest::Error> for LensError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LensError::Timeout
        } else if err.is_connect() {
            LensError::Network(err.to_string())
        } else if err.is_status() {
            LensError::Http(err.to_string())
        } else {
            LensError::Unknown
        }
    }
}

impl From<serde_json::Error> for LensError {
    fn from(err: serde_json::Error) -> Self {
        LensError::Store(err.to_string())
    }
}
