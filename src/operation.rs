//! Per-action operation lifecycle.
//!
//! An [`Operation<T>`] is created once per user-facing action (add a
//! document, ask a question, ...) and sequences every submission of that
//! action through the same states:
//!
//! ```text
//!            submit            ok
//!   Idle ───────────▶ Pending ─────▶ Succeeded
//!     ▲                 │  ▲             │
//!     │ reset           │  └── submit ───┤
//!     └─────────────────┤                │
//!                       └─────▶ Failed ◀─┘
//!                         err
//! ```
//!
//! # Stale-result suppression
//!
//! Every submission takes the next value of a strictly increasing sequence
//! number. When its call resolves, the outcome is applied only if that
//! number is still the latest one issued; otherwise it is dropped without
//! touching the record. A later submission therefore always wins, whatever
//! order the responses arrive in, and nothing has to be aborted.
//!
//! # Observation
//!
//! The record lives in a [`tokio::sync::watch`] channel. Front ends either
//! read [`Operation::snapshot`] or hold a receiver from
//! [`Operation::subscribe`] and re-render on `changed()`. Stale resolutions
//! and no-op resets do not notify.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{ApiResult, ClassifiedError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Pending => "pending",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        }
    }
}

/// Observable state of an [`Operation`].
///
/// `result` is set only in [`Phase::Succeeded`] and `error` only in
/// [`Phase::Failed`].
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord<T> {
    phase: Phase,
    result: Option<T>,
    error: Option<ClassifiedError>,
    sequence: u64,
}

impl<T> OperationRecord<T> {
    fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            result: None,
            error: None,
            sequence: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&ClassifiedError> {
        self.error.as_ref()
    }

    /// Latest sequence number issued by the owning operation.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn is_pending(&self) -> bool {
        self.phase == Phase::Pending
    }
}

impl<T> Default for OperationRecord<T> {
    fn default() -> Self {
        Self::idle()
    }
}

/// What happened to a resolved submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The outcome became the operation's terminal state.
    Applied,
    /// A newer submission (or a reset) superseded it; the outcome was dropped.
    Stale,
}

/// Race-free lifecycle for one user-facing action.
///
/// Cloning yields another handle to the same record.
pub struct Operation<T> {
    state: Arc<watch::Sender<OperationRecord<T>>>,
}

impl<T> Clone for Operation<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Send + Sync + 'static> Default for Operation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> Operation<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(watch::Sender::new(OperationRecord::idle())),
        }
    }

    /// Start a new submission.
    ///
    /// The record moves to [`Phase::Pending`] (prior result and error
    /// cleared) before this returns, so the busy state is visible before the
    /// call has even been polled. The returned future drives `call` and
    /// applies its outcome unless a newer submission has started meanwhile.
    ///
    /// Dropping the returned future without polling it leaves the record
    /// pending until the next `submit` or `reset`.
    pub fn submit<F>(&self, call: F) -> impl Future<Output = Settlement> + Send + 'static
    where
        F: Future<Output = ApiResult<T>> + Send + 'static,
    {
        self.submit_then(call, |_: &T| {})
    }

    /// [`submit`](Self::submit), running `on_applied` with a successful
    /// result only if that result is applied.
    ///
    /// The hook runs while the record is locked, before the transition is
    /// published, so no newer submission can start or settle in between.
    /// It must not touch this operation.
    pub fn submit_then<F, H>(
        &self,
        call: F,
        on_applied: H,
    ) -> impl Future<Output = Settlement> + Send + 'static
    where
        F: Future<Output = ApiResult<T>> + Send + 'static,
        H: FnOnce(&T) + Send + 'static,
    {
        let sequence = self.begin();
        let op = self.clone();
        async move {
            let outcome = call.await;
            op.settle(sequence, outcome, on_applied)
        }
    }

    /// [`submit`](Self::submit), driven on the tokio runtime.
    pub fn spawn<F>(&self, call: F) -> JoinHandle<Settlement>
    where
        F: Future<Output = ApiResult<T>> + Send + 'static,
    {
        tokio::spawn(self.submit(call))
    }

    /// Return to [`Phase::Idle`], clearing result and error.
    ///
    /// A pending submission is retired: its outcome will be treated as
    /// stale. On an idle record this does nothing and notifies nobody.
    /// Returns whether the record changed.
    pub fn reset(&self) -> bool {
        self.state.send_if_modified(|rec| {
            match rec.phase {
                Phase::Idle => return false,
                Phase::Pending => rec.sequence += 1,
                Phase::Succeeded | Phase::Failed => {}
            }
            rec.phase = Phase::Idle;
            rec.result = None;
            rec.error = None;
            true
        })
    }

    /// Receiver notified on every applied transition.
    pub fn subscribe(&self) -> watch::Receiver<OperationRecord<T>> {
        self.state.subscribe()
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    pub fn sequence(&self) -> u64 {
        self.state.borrow().sequence
    }

    fn begin(&self) -> u64 {
        let mut sequence = 0;
        self.state.send_modify(|rec| {
            rec.sequence += 1;
            rec.phase = Phase::Pending;
            rec.result = None;
            rec.error = None;
            sequence = rec.sequence;
        });
        tracing::debug!(sequence, "submission started");
        sequence
    }

    fn settle<H>(&self, sequence: u64, outcome: ApiResult<T>, on_applied: H) -> Settlement
    where
        H: FnOnce(&T),
    {
        let applied = self.state.send_if_modified(|rec| {
            if rec.sequence != sequence || rec.phase != Phase::Pending {
                tracing::debug!(
                    sequence,
                    latest = rec.sequence,
                    "discarding stale resolution"
                );
                return false;
            }
            match outcome {
                Ok(value) => {
                    on_applied(&value);
                    rec.phase = Phase::Succeeded;
                    rec.result = Some(value);
                    rec.error = None;
                }
                Err(err) => {
                    rec.phase = Phase::Failed;
                    rec.result = None;
                    rec.error = Some(err);
                }
            }
            true
        });

        if applied {
            Settlement::Applied
        } else {
            Settlement::Stale
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Operation<T> {
    /// Copy of the current record.
    pub fn snapshot(&self) -> OperationRecord<T> {
        self.state.borrow().clone()
    }
}
