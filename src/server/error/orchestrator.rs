use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Orchestrator request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Orchestrator returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Orchestrator did not answer within {0} seconds")]
    Timeout(u64),

    #[error("Unknown orchestrator phase '{0}'")]
    UnknownPhase(String),
}
