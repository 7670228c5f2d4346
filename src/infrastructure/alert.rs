use crate::domain::timer::Phase;
use crate::infrastructure::error::InfraError;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One-shot phase-completion notification. Fire-and-forget: the caller
/// logs failures and never propagates them.
pub trait AlertSink: Send + Sync {
    fn play(&self, completed_phase: Phase) -> Result<(), InfraError>;
}

/// Default sink. Audio playback lives in the webview; the backend emits
/// nothing here, which keeps completion observable via the command log
/// alone.
#[derive(Debug, Default)]
pub struct SilentAlertSink;

impl AlertSink for SilentAlertSink {
    fn play(&self, _completed_phase: Phase) -> Result<(), InfraError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CountingAlertSink {
    plays: AtomicUsize,
}

impl CountingAlertSink {
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::Relaxed)
    }
}

impl AlertSink for CountingAlertSink {
    fn play(&self, _completed_phase: Phase) -> Result<(), InfraError> {
        self.plays.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Sink that always fails, for exercising the swallow-and-log path.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FailingAlertSink;

#[cfg(test)]
impl AlertSink for FailingAlertSink {
    fn play(&self, _completed_phase: Phase) -> Result<(), InfraError> {
        Err(InfraError::InvalidConfig("audio device unavailable".to_string()))
    }
}
