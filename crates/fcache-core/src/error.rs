use thiserror::Error;

pub type FcacheResult<T> = Result<T, FcacheError>;

#[derive(Debug, Error)]
pub enum FcacheError {
    #[error("config error: {0}")]
    Config(String),

    #[error("parsing config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
