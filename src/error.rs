use thiserror::Error;

#[derive(Error, Debug)]
pub enum WargaError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("No active user. Run `warga login <username>` or pass --as <username>.")]
    NoPrincipal,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("You cannot delete your own account")]
    SelfDeletion,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid month: {0} (expected YYYY-MM)")]
    InvalidMonth(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, WargaError>;
