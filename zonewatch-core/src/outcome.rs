use std::fmt;

use zonewatch_model::ProcessingOutcome;

/// Observer hook for per-file processing results.
///
/// Called synchronously from the pipeline; implementations must be cheap
/// and must never panic.
pub trait OutcomeSink: Send + Sync {
    fn on_outcome(&self, outcome: &ProcessingOutcome);
}

/// No-op sink used when nothing consumes outcomes.
pub struct NoopOutcomeSink;

impl OutcomeSink for NoopOutcomeSink {
    fn on_outcome(&self, _outcome: &ProcessingOutcome) {}
}

impl fmt::Debug for NoopOutcomeSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NoopOutcomeSink")
    }
}
