use crate::level::Level;
use std::error::Error;

/// Error type shared by every fallible operation of the crate.
///
/// The panicking entry points (`emit`, [`crate::middleware::get_logger`]) panic
/// with the `Display` text of one of these variants.
#[derive(thiserror::Error, Debug)]
pub enum LogError {
    #[error("invalid level '{0}'")]
    InvalidLevel(String),

    #[error("unknown formatter '{0}', expected 'json' or 'line'")]
    UnknownFormat(String),

    #[error("the logger cannot create the message :: {0}")]
    Format(#[source] Box<dyn Error + Send + Sync>),

    #[error("cannot write in {level} logger :: {source}")]
    Sink {
        level: Level,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    #[error("the context does not contain any logger under key '{0}'")]
    MissingLogger(String),

    #[error("invalid logger data type under key '{0}'")]
    WrongContextType(String),
}
