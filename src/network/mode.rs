use serde::{Serialize, Deserialize};

/// Whether a forward pass runs with stochastic regularization.
///
/// Passed explicitly to every forward call; the head carries no mode of its
/// own, so one call can never observe another call's mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Dropout active; used only by the optimization step.
    Training,
    /// Deterministic full-capacity inference; used for metrics and prediction.
    Evaluation,
}
