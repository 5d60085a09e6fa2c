//! Synchronized navigation across every album in a comparison.
//!
//! The controller owns one page index shared by all queued albums. Each
//! accepted index change bumps a generation counter and produces a
//! [`LoadBatch`] with one image load per album. The caller runs those loads
//! however it likes and reports each result back through
//! [`NavigationController::on_tile_load_settled`]. Navigation stays disabled
//! until every load of the current generation has settled, and results
//! tagged with an older generation never touch tile state.

use thiserror::Error;
use tracing::{debug, trace};

use crate::layout::{CachedLayoutSolver, ComparisonLayout, ComparisonLayoutResult};
use crate::models::{max_index, Album, LoadedImage, TileState, Viewport};

/// Fewest albums a comparison session accepts.
pub const MIN_QUEUE_LEN: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a comparison needs at least 2 albums, got {found}")]
    TooFewAlbums { found: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Loads of the current generation are still in flight.
    Loading,
    /// Every load settled; navigation is enabled.
    Ready,
}

/// One image load the caller must start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Tile (queue position) the image belongs to.
    pub tile: usize,
    pub album_id: String,
    /// Position of `url` within the album.
    pub image_index: usize,
    pub url: String,
    /// Generation to hand back with the result.
    pub generation: u64,
}

/// All loads for one accepted navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBatch {
    pub generation: u64,
    pub index: usize,
    pub requests: Vec<LoadRequest>,
}

/// What a settled load did to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The load belongs to a superseded generation and was discarded.
    Stale,
    /// The tile was not waiting on a load (duplicate or unknown tile).
    Ignored,
    /// Applied; other loads of this generation are still outstanding.
    Pending { remaining: usize },
    /// Applied; the batch is complete and the layout was recomputed.
    Ready,
}

pub struct NavigationController {
    albums: Vec<Album>,
    solver: CachedLayoutSolver,
    viewport: Viewport,
    current_index: usize,
    max_index: Option<usize>,
    phase: Phase,
    generation: u64,
    /// Tiles still owed a settlement in the current generation.
    outstanding: Vec<bool>,
    remaining: usize,
    tiles: Vec<TileState>,
    layout: ComparisonLayoutResult,
    stale_settlements: u64,
}

impl NavigationController {
    /// Starts a session on a snapshot of `albums` at index 0.
    ///
    /// Returns the controller together with the initial load batch.
    pub fn open(
        albums: Vec<Album>,
        layout: ComparisonLayout,
        viewport: Viewport,
    ) -> Result<(Self, LoadBatch), SessionError> {
        if albums.len() < MIN_QUEUE_LEN {
            return Err(SessionError::TooFewAlbums {
                found: albums.len(),
            });
        }

        let solver = CachedLayoutSolver::new(layout);
        let count = albums.len();
        let initial_layout = solver.compute(count, viewport);

        let mut controller = Self {
            max_index: max_index(&albums),
            albums,
            solver,
            viewport,
            current_index: 0,
            phase: Phase::Loading,
            generation: 0,
            outstanding: vec![false; count],
            remaining: 0,
            tiles: vec![TileState::Empty; count],
            layout: initial_layout,
            stale_settlements: 0,
        };

        debug!(
            albums = count,
            max_index = ?controller.max_index,
            "Opened comparison session"
        );

        let batch = controller.fan_out();
        Ok((controller, batch))
    }

    /// Moves every tile to `index`.
    ///
    /// Returns `None` without touching any state when a batch is still
    /// loading, when `index` is outside `0..=max_index`, or when no album
    /// has images.
    pub fn request_index(&mut self, index: isize) -> Option<LoadBatch> {
        if self.is_loading() {
            trace!(index, generation = self.generation, "Navigation dropped while loading");
            return None;
        }

        let Some(max) = self.max_index else {
            trace!(index, "Navigation disabled, no album has images");
            return None;
        };

        let index = match usize::try_from(index) {
            Ok(i) if i <= max => i,
            _ => {
                trace!(index, max, "Navigation out of bounds");
                return None;
            }
        };

        self.current_index = index;
        Some(self.fan_out())
    }

    pub fn next(&mut self) -> Option<LoadBatch> {
        self.request_index(self.current_index as isize + 1)
    }

    pub fn prev(&mut self) -> Option<LoadBatch> {
        self.request_index(self.current_index as isize - 1)
    }

    /// Records the result of one load.
    ///
    /// Failures count toward completion exactly like successes; the tile is
    /// left in [`TileState::Failed`].
    pub fn on_tile_load_settled(
        &mut self,
        tile: usize,
        generation: u64,
        outcome: Result<LoadedImage, String>,
    ) -> SettleOutcome {
        if generation != self.generation {
            self.stale_settlements += 1;
            trace!(
                tile,
                generation,
                live = self.generation,
                "Discarding stale load"
            );
            return SettleOutcome::Stale;
        }

        if !self.outstanding.get(tile).copied().unwrap_or(false) {
            trace!(tile, generation, "Ignoring settlement for idle tile");
            return SettleOutcome::Ignored;
        }

        self.outstanding[tile] = false;
        self.remaining -= 1;

        self.tiles[tile] = match outcome {
            Ok(image) => TileState::Loaded(image),
            Err(reason) => {
                let url = self.tiles[tile].url().unwrap_or_default().to_string();
                debug!(tile, %url, %reason, "Tile load failed");
                TileState::Failed { url, reason }
            }
        };

        if self.remaining > 0 {
            return SettleOutcome::Pending {
                remaining: self.remaining,
            };
        }

        self.finish_batch();
        SettleOutcome::Ready
    }

    /// Re-lays out the tiles for a new viewport.
    ///
    /// Does nothing while a batch is loading; the new size is still
    /// remembered and used once the batch settles.
    pub fn resize(&mut self, viewport: Viewport) -> Option<&ComparisonLayoutResult> {
        self.viewport = viewport;
        if self.is_loading() {
            return None;
        }
        self.layout = self.solver.compute(self.albums.len(), viewport);
        Some(&self.layout)
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn max_index(&self) -> Option<usize> {
        self.max_index
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn can_prev(&self) -> bool {
        !self.is_loading() && self.max_index.is_some() && self.current_index > 0
    }

    pub fn can_next(&self) -> bool {
        !self.is_loading()
            && self
                .max_index
                .is_some_and(|max| self.current_index < max)
    }

    pub fn tiles(&self) -> &[TileState] {
        &self.tiles
    }

    pub fn layout(&self) -> &ComparisonLayoutResult {
        &self.layout
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Loads still owed a settlement in the current generation.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn stale_settlements(&self) -> u64 {
        self.stale_settlements
    }

    /// One-based "current / total" page label.
    pub fn counter_label(&self) -> String {
        match self.max_index {
            Some(max) => format!("{} / {}", self.current_index + 1, max + 1),
            None => "0 / 0".to_string(),
        }
    }

    fn fan_out(&mut self) -> LoadBatch {
        self.generation += 1;
        self.phase = Phase::Loading;

        let mut requests = Vec::with_capacity(self.albums.len());
        for (tile, album) in self.albums.iter().enumerate() {
            match album.image_at(self.current_index) {
                Some((image_index, url)) => {
                    self.outstanding[tile] = true;
                    self.tiles[tile] = TileState::Pending {
                        url: url.to_string(),
                    };
                    requests.push(LoadRequest {
                        tile,
                        album_id: album.id.clone(),
                        image_index,
                        url: url.to_string(),
                        generation: self.generation,
                    });
                }
                None => {
                    self.outstanding[tile] = false;
                    self.tiles[tile] = TileState::Empty;
                }
            }
        }

        self.remaining = requests.len();
        debug!(
            index = self.current_index,
            generation = self.generation,
            loads = requests.len(),
            "Fanning out tile loads"
        );

        if self.remaining == 0 {
            self.finish_batch();
        }

        LoadBatch {
            generation: self.generation,
            index: self.current_index,
            requests,
        }
    }

    fn finish_batch(&mut self) {
        self.phase = Phase::Ready;
        self.layout = self.solver.compute(self.albums.len(), self.viewport);
        debug!(
            index = self.current_index,
            generation = self.generation,
            cols = self.layout.cols,
            rows = self.layout.rows,
            "Comparison ready"
        );
    }
}
