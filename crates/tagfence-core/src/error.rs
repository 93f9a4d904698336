use thiserror::Error;

#[derive(Error, Debug)]
pub enum TagFenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("unresolved import '{reference}' at {file}:{line}")]
    UnresolvedImport {
        reference: String,
        file: String,
        line: u32,
    },
}

pub type Result<T> = std::result::Result<T, TagFenceError>;
