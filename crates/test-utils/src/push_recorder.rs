use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use odo_watch::engine::{ComponentStatus, PushFuture, PushHandler, PushParameters};
use odo_watch::errors::PushError;
use odo_watch::types::ComponentState;

/// What a scripted push does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushBehaviour {
    Succeed,
    Fail,
    Fatal,
}

/// One call to the handler.
#[derive(Debug, Clone)]
pub struct PushRecord {
    pub params: PushParameters,
    pub at: Instant,
    /// State the loop put the component in before calling the handler.
    pub state: ComponentState,
}

#[derive(Debug, Default)]
struct Inner {
    records: Vec<PushRecord>,
    script: VecDeque<PushBehaviour>,
}

/// A push handler that:
/// - records every call with the time it happened
/// - follows a script of outcomes, succeeding once the script runs out.
///
/// Clones share the same record, so a test keeps one clone and hands the
/// other to the session.
#[derive(Debug, Clone, Default)]
pub struct RecordingPushHandler {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingPushHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes for the next pushes, in order.
    pub fn script(self, outcomes: impl IntoIterator<Item = PushBehaviour>) -> Self {
        self.inner.lock().unwrap().script.extend(outcomes);
        self
    }

    pub fn boxed(&self) -> Box<dyn PushHandler> {
        Box::new(self.clone())
    }

    pub fn records(&self) -> Vec<PushRecord> {
        self.inner.lock().unwrap().records.clone()
    }

    pub fn count(&self) -> usize {
        self.inner.lock().unwrap().records.len()
    }

    /// Poll until at least `n` pushes were recorded. Works under paused time.
    pub async fn wait_for(&self, n: usize) -> Vec<PushRecord> {
        while self.count() < n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.records()
    }
}

impl PushHandler for RecordingPushHandler {
    fn push<'a>(
        &'a mut self,
        params: PushParameters,
        status: &'a mut ComponentStatus,
    ) -> PushFuture<'a> {
        Box::pin(async move {
            let behaviour = {
                let mut inner = self.inner.lock().unwrap();
                inner.records.push(PushRecord {
                    params,
                    at: Instant::now(),
                    state: status.state(),
                });
                inner.script.pop_front().unwrap_or(PushBehaviour::Succeed)
            };

            match behaviour {
                PushBehaviour::Succeed => Ok(()),
                PushBehaviour::Fail => Err(PushError::Failed("sync failed".to_string())),
                PushBehaviour::Fatal => Err(PushError::Fatal("port forwarding failed".to_string())),
            }
        })
    }
}
