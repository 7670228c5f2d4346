use crate::application::commands::{tick_timer_impl, AppState};
use std::sync::Weak;
use std::time::Duration;

/// One-second tick source for a running timer.
///
/// The handle aborts its task on drop, so replacing or clearing the slot
/// that owns it is the cancel side of cancel-and-reschedule. The task holds
/// only a weak reference to the state: a stale tick can never mutate a
/// state that has been torn down.
pub struct TickerHandle {
    task: tokio::task::JoinHandle<()>,
}

impl TickerHandle {
    pub fn spawn(state: Weak<AppState>) -> Self {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(state) = state.upgrade() else {
                    break;
                };
                match tick_timer_impl(&state) {
                    Ok(snapshot) if snapshot.running => {}
                    // The timer paused (phase boundary) or the state is
                    // unusable; either way this schedule is done.
                    _ => break,
                }
            }
        });
        Self { task }
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
