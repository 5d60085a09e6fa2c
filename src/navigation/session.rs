//! Tokio driver for [`NavigationController`].
//!
//! Every [`LoadRequest`](super::LoadRequest) becomes its own spawned task.
//! Results come back over an unbounded channel and are applied one at a time
//! by whoever owns the session, so controller state is never touched from
//! two places at once. Results carry the session id and the generation they
//! were issued for; anything from an older session or generation is dropped.

use std::sync::Arc;

use async_channel::{Receiver, Sender};
use tracing::{debug, info, trace, warn};

use super::controller::{LoadBatch, NavigationController, SessionError, SettleOutcome};
use crate::image_loader::ImageLoader;
use crate::layout::{ComparisonLayout, ComparisonLayoutResult};
use crate::models::{ComparisonQueue, LoadedImage, Viewport};

/// Result of one spawned load, tagged with where it came from.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub session_id: u64,
    pub tile: usize,
    pub generation: u64,
    pub outcome: Result<LoadedImage, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Ready,
}

struct ActiveSession {
    id: u64,
    controller: NavigationController,
}

pub struct ComparisonSession<L: ImageLoader> {
    loader: Arc<L>,
    layout: ComparisonLayout,
    viewport: Viewport,
    active: Option<ActiveSession>,
    next_session_id: u64,
    settle_tx: Sender<Settlement>,
    settle_rx: Receiver<Settlement>,
}

impl<L: ImageLoader> ComparisonSession<L> {
    pub fn new(loader: L, layout: ComparisonLayout, viewport: Viewport) -> Self {
        let (settle_tx, settle_rx) = async_channel::unbounded();
        Self {
            loader: Arc::new(loader),
            layout,
            viewport,
            active: None,
            next_session_id: 0,
            settle_tx,
            settle_rx,
        }
    }

    /// Opens a comparison on a snapshot of `queue`, replacing any open one.
    ///
    /// A rejected queue leaves the open session untouched. Must be called
    /// from within a Tokio runtime.
    pub fn open(&mut self, queue: &ComparisonQueue) -> Result<(), SessionError> {
        let (controller, batch) = NavigationController::open(
            queue.albums().to_vec(),
            self.layout.clone(),
            self.viewport,
        )?;

        self.close();
        self.next_session_id += 1;
        let id = self.next_session_id;
        info!(
            session = id,
            albums = queue.len(),
            max_index = ?controller.max_index(),
            "Comparison session opened"
        );

        self.active = Some(ActiveSession { id, controller });
        self.dispatch(id, batch);
        Ok(())
    }

    /// Ends the session. In-flight loads keep running but their results
    /// are discarded.
    pub fn close(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                debug!(session = active.id, "Comparison session closed");
                true
            }
            None => false,
        }
    }

    /// Returns true if the navigation was accepted and loads were started.
    pub fn request_index(&mut self, index: isize) -> bool {
        self.navigate(|controller| controller.request_index(index))
    }

    pub fn next(&mut self) -> bool {
        self.navigate(NavigationController::next)
    }

    pub fn prev(&mut self) -> bool {
        self.navigate(NavigationController::prev)
    }

    /// Records the new viewport and re-lays out the tiles if the session is
    /// ready.
    pub fn resize(&mut self, viewport: Viewport) -> Option<ComparisonLayoutResult> {
        self.viewport = viewport;
        let active = self.active.as_mut()?;
        active.controller.resize(viewport).cloned()
    }

    /// Waits for the next load result and applies it.
    pub async fn settle_next(&mut self) -> SettleOutcome {
        let settlement = match self.settle_rx.recv().await {
            Ok(settlement) => settlement,
            Err(_) => return SettleOutcome::Stale,
        };

        match self.active.as_mut() {
            Some(active) if active.id == settlement.session_id => active
                .controller
                .on_tile_load_settled(settlement.tile, settlement.generation, settlement.outcome),
            _ => {
                trace!(
                    session = settlement.session_id,
                    tile = settlement.tile,
                    "Discarding load from closed session"
                );
                SettleOutcome::Stale
            }
        }
    }

    /// Applies results until the current batch has fully settled.
    ///
    /// Returns `None` when no session is open. A load that never completes
    /// keeps this waiting.
    pub async fn wait_ready(&mut self) -> Option<&NavigationController> {
        loop {
            match self.active.as_ref().map(|a| a.controller.is_loading()) {
                None => return None,
                Some(false) => break,
                Some(true) => {
                    self.settle_next().await;
                }
            }
        }
        self.controller()
    }

    pub fn state(&self) -> SessionState {
        match &self.active {
            None => SessionState::Idle,
            Some(active) if active.controller.is_loading() => SessionState::Loading,
            Some(_) => SessionState::Ready,
        }
    }

    pub fn controller(&self) -> Option<&NavigationController> {
        self.active.as_ref().map(|a| &a.controller)
    }

    pub fn session_id(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.id)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn navigate(&mut self, f: impl FnOnce(&mut NavigationController) -> Option<LoadBatch>) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        let id = active.id;
        match f(&mut active.controller) {
            Some(batch) => {
                self.dispatch(id, batch);
                true
            }
            None => false,
        }
    }

    fn dispatch(&self, session_id: u64, batch: LoadBatch) {
        for request in batch.requests {
            let loader = Arc::clone(&self.loader);
            let tx = self.settle_tx.clone();
            tokio::spawn(async move {
                let outcome = loader
                    .load(&request.url)
                    .await
                    .map_err(|e| format!("{:#}", e));
                if let Err(error) = &outcome {
                    warn!(url = %request.url, %error, "Image load failed");
                }
                let settlement = Settlement {
                    session_id,
                    tile: request.tile,
                    generation: request.generation,
                    outcome,
                };
                if tx.send(settlement).await.is_err() {
                    trace!("Settlement channel closed");
                }
            });
        }
    }
}
