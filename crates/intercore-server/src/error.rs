//! Errors raised while configuring or starting the front door.

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Failed to bind: {0}")]
    Bind(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("Server already started")]
    AlreadyStarted,

    #[error("Server was stopped and cannot be restarted")]
    Stopped,
}
