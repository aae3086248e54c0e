//! Per-session sync state.

use indexmap::IndexMap;
use parking_lot::Mutex;
use rolodex_engine::{error::Result, Conflict, Error, NormalizedPhone};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// State carried between sync runs.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Conflicts awaiting a decision, keyed by normalized phone
    outstanding: IndexMap<NormalizedPhone, Conflict>,
}

impl SessionState {
    /// Replace the outstanding set with the conflicts of a fresh run.
    pub fn replace_conflicts(&mut self, conflicts: Vec<Conflict>) {
        self.outstanding = conflicts
            .into_iter()
            .map(|c| (c.key.clone(), c))
            .collect();
    }

    pub fn conflicts(&self) -> Vec<Conflict> {
        self.outstanding.values().cloned().collect()
    }

    /// Drop settled keys, keeping the order of the rest.
    pub fn settle<'a>(&mut self, keys: impl IntoIterator<Item = &'a NormalizedPhone>) {
        for key in keys {
            self.outstanding.shift_remove(key);
        }
    }
}

/// An operation holding the session exclusively.
pub struct SyncRun<'a> {
    pub state: MutexGuard<'a, SessionState>,
    pub cancel: CancellationToken,
    control: &'a Mutex<Control>,
}

impl Drop for SyncRun<'_> {
    fn drop(&mut self) {
        self.control.lock().running = false;
    }
}

/// Cancellation target of the running operation.
#[derive(Default)]
struct Control {
    running: bool,
    token: CancellationToken,
}

/// Serializes operations on one session and carries their cancellation token.
#[derive(Default)]
pub struct SyncSession {
    state: AsyncMutex<SessionState>,
    control: Mutex<Control>,
}

impl SyncSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the session. Fails immediately with `SyncInProgress` when
    /// another operation holds it.
    ///
    /// The fresh token is installed under the control lock, so a concurrent
    /// [`Self::cancel`] either sees no run or reaches this one.
    pub fn begin(&self) -> Result<SyncRun<'_>> {
        let mut control = self.control.lock();
        let state = self.state.try_lock().map_err(|_| Error::SyncInProgress)?;
        control.token = CancellationToken::new();
        control.running = true;
        Ok(SyncRun {
            state,
            cancel: control.token.clone(),
            control: &self.control,
        })
    }

    /// Request cancellation of the running operation.
    ///
    /// Returns whether an operation was running.
    pub fn cancel(&self) -> bool {
        let control = self.control.lock();
        if control.running {
            control.token.cancel();
        }
        control.running
    }

    /// Snapshot of the outstanding conflicts.
    pub fn outstanding(&self) -> Result<Vec<Conflict>> {
        let state = self.state.try_lock().map_err(|_| Error::SyncInProgress)?;
        Ok(state.conflicts())
    }
}
