use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

/// Returned by [`CancellationController::begin`] while another turn holds the
/// active handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnInFlight {
    pub turn_id: u64,
}

impl fmt::Display for TurnInFlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn {} is still in flight", self.turn_id)
    }
}

impl Error for TurnInFlight {}

#[derive(Debug, Default)]
struct Slot {
    token: Option<CancellationToken>,
    turn_id: u64,
}

/// Hands out one cancellation token per turn and lets anyone holding a clone
/// of the controller stop that turn.
///
/// Clones share state, so the UI can keep one while the session drives the
/// read loop with another. [`trigger`](Self::trigger) never blocks.
#[derive(Debug, Clone, Default)]
pub struct CancellationController {
    slot: Arc<Mutex<Slot>>,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create the token for a new turn.
    pub fn begin(&self) -> Result<(CancellationToken, u64), TurnInFlight> {
        let mut slot = self.slot();
        if slot.token.is_some() {
            return Err(TurnInFlight {
                turn_id: slot.turn_id,
            });
        }
        slot.turn_id += 1;
        let token = CancellationToken::new();
        slot.token = Some(token.clone());
        Ok((token, slot.turn_id))
    }

    /// Request cancellation of the active turn.
    ///
    /// Returns `false` when there is no active turn; triggering twice is the
    /// same as triggering once.
    pub fn trigger(&self) -> bool {
        match &self.slot().token {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_requested(&self) -> bool {
        self.slot()
            .token
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    pub fn is_active(&self) -> bool {
        self.slot().token.is_some()
    }

    /// Drop the handle held by `turn_id` so the next turn can begin.
    ///
    /// Does nothing if that turn no longer holds the handle.
    pub fn release(&self, turn_id: u64) {
        let mut slot = self.slot();
        if slot.turn_id == turn_id {
            slot.token = None;
        }
    }
}
