use thiserror::Error;

// ---------------------------------------------------------------------------
// Pipeline errors
// ---------------------------------------------------------------------------

/// Errors raised by the core pipeline. Every variant aborts the affected
/// pipeline run; nothing is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A stage received (or produced) zero rows where at least one is required.
    #[error("{stage}: no candidate rows left")]
    EmptyInput { stage: &'static str },

    /// One or more `peak_id` groups sum to zero confidence, or their sum
    /// overflows, so the per-group rescale to 100 is undefined.
    #[error(
        "{stage}: peak group(s) whose total confidence is zero or overflows: {}",
        peak_ids.join(", ")
    )]
    DegenerateGroup {
        stage: &'static str,
        peak_ids: Vec<String>,
    },

    /// A sialylated row failed ingestion checks.
    #[error("row {row} is malformed: {reason}")]
    MalformedRow { row: usize, reason: String },

    /// Every populated bin has zero intensity, so the max-rescale is undefined.
    #[error("spectrum binning: every bin has zero intensity")]
    ZeroIntensity,

    /// Summed bin intensity overflowed, so the max-rescale is undefined.
    #[error("spectrum binning: summed bin intensity is not finite")]
    IntensityOverflow,

    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    pub(crate) fn malformed(row: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            row,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
