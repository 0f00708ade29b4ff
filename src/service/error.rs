#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to listen on {addr}: {message}")]
    Bind { addr: String, message: String },
}
