use helpers::general::InputValueError;
use thiserror::Error;

/// SimError covers everything that can go wrong inside the championship core. File and payload
/// problems are reported by the readers in `pre` via anyhow instead.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Competitor {id} has invalid points value {points} (must be finite and non-negative)")]
    InvalidPoints { id: String, points: f64 },

    #[error(transparent)]
    InputValue(#[from] InputValueError),

    #[error("Simulation was cancelled")]
    Cancelled,

    #[error("Simulation worker disconnected before sending a result")]
    WorkerDisconnected,
}
