use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsroomError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Feed error: {0}")]
    Feed(String),

    // Delivery faults are not errors here: send attempts resolve to a typed
    // outcome the orchestrator loops on.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
