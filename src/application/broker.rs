// SPDX-License-Identifier: MPL-2.0
//! Inference request correlation.
//!
//! The broker hands out request ids, forwards `PROCESS_FRAMES` to the
//! engine and keeps a pending table mapping each id to a single-use result
//! slot. Exactly one of three paths resolves a request:
//!
//! - a matching engine reply ([`RequestBroker::resolve`])
//! - the per-request timer (`"Request timeout"`)
//! - an explicit sweep ([`RequestBroker::clear`])
//!
//! Whichever path removes the table entry owns the sender, so a request can
//! never resolve twice. Replies for ids no longer in the table are dropped.

use crate::application::protocol::{EngineCommand, InferenceResult};
use crate::domain::detection::RequestId;
use crate::domain::frame::FrameBatch;
use crate::error::DetectionError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;

/// Default deadline for an engine reply.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

struct PendingEntry {
    slot: oneshot::Sender<InferenceResult>,
    timer: AbortHandle,
}

struct BrokerState {
    pending: HashMap<RequestId, PendingEntry>,
    next_id: RequestId,
}

impl BrokerState {
    /// Removes an entry and delivers `result` through its slot.
    fn settle(&mut self, result: InferenceResult) -> bool {
        let Some(entry) = self.pending.remove(&result.request_id) else {
            return false;
        };
        entry.timer.abort();
        // The waiter may have been abandoned by a rebind.
        let _ = entry.slot.send(result);
        true
    }
}

/// Handle to the pending-request table. Clones share the table.
#[derive(Clone)]
pub struct RequestBroker {
    state: Arc<Mutex<BrokerState>>,
    engine: mpsc::UnboundedSender<EngineCommand>,
    timeout: Duration,
}

impl std::fmt::Debug for RequestBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBroker")
            .field("pending", &self.pending_count())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// The waiting side of one submitted request.
#[derive(Debug)]
pub struct PendingInference {
    id: RequestId,
    slot: oneshot::Receiver<InferenceResult>,
}

impl PendingInference {
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Waits for the single result of this request.
    pub async fn wait(self) -> InferenceResult {
        let id = self.id;
        self.slot.await.unwrap_or_else(|_| {
            InferenceResult::failure(id, DetectionError::Cancelled("broker dropped".to_string()))
        })
    }
}

impl RequestBroker {
    /// Creates a broker that forwards requests on `engine`.
    #[must_use]
    pub fn new(engine: mpsc::UnboundedSender<EngineCommand>, timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(BrokerState {
                pending: HashMap::new(),
                next_id: RequestId::new(0),
            })),
            engine,
            timeout,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a request for `frames`, sends it to the engine and arms its
    /// timeout.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, frames: FrameBatch) -> PendingInference {
        let (slot, rx) = oneshot::channel();

        let id = {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id = id.next();
            let timer = spawn_timer(Arc::downgrade(&self.state), id, self.timeout);
            state.pending.insert(id, PendingEntry { slot, timer });
            id
        };

        let command = EngineCommand::ProcessFrames {
            request_id: id,
            frames,
        };
        if self.engine.send(command).is_err() {
            log::warn!("Inference engine is gone, failing request {id}");
            self.lock().settle(InferenceResult::failure(
                id,
                DetectionError::EngineFailure("inference engine is not running".to_string()),
            ));
        }

        PendingInference { id, slot: rx }
    }

    /// Delivers an engine reply to its waiter.
    ///
    /// Returns false when no pending request matches; the reply is dropped.
    pub fn resolve(&self, result: InferenceResult) -> bool {
        let id = result.request_id;
        let matched = self.lock().settle(result);
        if !matched {
            log::trace!("Dropping reply for unknown request {id}");
        }
        matched
    }

    /// Force-resolves every pending request with a [`DetectionError::Cancelled`]
    /// failure and empties the table. Returns the number of requests swept.
    pub fn clear(&self, reason: &str) -> usize {
        let drained: Vec<(RequestId, PendingEntry)> = self.lock().pending.drain().collect();
        let count = drained.len();
        for (id, entry) in drained {
            entry.timer.abort();
            let _ = entry.slot.send(InferenceResult::failure(
                id,
                DetectionError::Cancelled(reason.to_string()),
            ));
        }
        count
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    #[must_use]
    pub fn is_pending(&self, id: RequestId) -> bool {
        self.lock().pending.contains_key(&id)
    }
}

fn spawn_timer(state: Weak<Mutex<BrokerState>>, id: RequestId, timeout: Duration) -> AbortHandle {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        let Some(state) = state.upgrade() else {
            return;
        };
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.settle(InferenceResult::failure(id, DetectionError::RequestTimeout)) {
            log::debug!("Request {id} timed out");
        }
    })
    .abort_handle()
}
