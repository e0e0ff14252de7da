use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("runtime bootstrap failed: {0}")]
    Bootstrap(String),
}
