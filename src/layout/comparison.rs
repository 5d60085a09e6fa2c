use crate::models::{TileGeometry, Viewport};

/// Portrait ratio of the source renders the comparison grid is tuned for.
pub const DEFAULT_TARGET_ASPECT: f64 = 1056.0 / 1536.0;

/// Weight of the aspect penalty against raw cell area.
const ASPECT_PENALTY_WEIGHT: f64 = 1.5;

/// Configuration for the comparison grid solver.
///
/// The solver picks a column/row count for `count` tiles that maximizes cell
/// area while keeping cells close to `target_aspect`, then sizes tiles to the
/// target aspect and centres the block inside the content box.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonLayout {
    /// Width / height ratio tiles are sized to (default: 0.6875)
    pub target_aspect: f64,
    /// Gap between tiles in pixels (default: 16)
    pub gap: f64,
    /// Space reserved above the grid for the header (default: 64)
    pub margin_top: f64,
    /// Space reserved below the grid for navigation controls (default: 64)
    pub margin_bottom: f64,
    /// Space reserved on each side (default: 32)
    pub margin_side: f64,
}

impl Default for ComparisonLayout {
    fn default() -> Self {
        Self {
            target_aspect: DEFAULT_TARGET_ASPECT,
            gap: 16.0,
            margin_top: 64.0,
            margin_bottom: 64.0,
            margin_side: 32.0,
        }
    }
}

/// Column and row count chosen for a tile count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub cols: usize,
    pub rows: usize,
}

/// Solver output: grid shape, shared tile size and one rectangle per tile.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonLayoutResult {
    pub cols: usize,
    pub rows: usize,
    pub tile_width: f64,
    pub tile_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Row-major, one entry per tile.
    pub tiles: Vec<TileGeometry>,
}

impl ComparisonLayoutResult {
    pub fn shape(&self) -> GridShape {
        GridShape {
            cols: self.cols,
            rows: self.rows,
        }
    }

    pub fn tile(&self, index: usize) -> Option<&TileGeometry> {
        self.tiles.get(index)
    }
}

impl ComparisonLayout {
    /// Creates a ComparisonLayout with custom parameters.
    pub fn new(target_aspect: f64, gap: f64, margin_top: f64, margin_bottom: f64, margin_side: f64) -> Self {
        Self {
            target_aspect,
            gap,
            margin_top,
            margin_bottom,
            margin_side,
        }
    }

    /// Size of the box tiles are placed in.
    pub fn content_area(&self, viewport: Viewport) -> (f64, f64) {
        (
            viewport.width - self.margin_side * 2.0,
            viewport.height - self.margin_top - self.margin_bottom,
        )
    }

    /// Log-distance of a cell's aspect from the target.
    ///
    /// A zero or NaN cell aspect is scored as a square cell.
    pub fn aspect_penalty(&self, cell_width: f64, cell_height: f64) -> f64 {
        let mut cell_aspect = cell_width / cell_height;
        if cell_aspect == 0.0 || cell_aspect.is_nan() {
            cell_aspect = 1.0;
        }
        (cell_aspect / self.target_aspect).ln().abs()
    }

    /// Score of one candidate cell: area divided by the aspect penalty.
    pub fn score(&self, cell_width: f64, cell_height: f64) -> f64 {
        let aspect_penalty = self.aspect_penalty(cell_width, cell_height);
        (cell_width * cell_height) / (1.0 + aspect_penalty * ASPECT_PENALTY_WEIGHT)
    }

    /// Searches every column count for the best-scoring grid.
    ///
    /// `width`/`height` are the content box dimensions. Ties keep the first
    /// (fewest columns) candidate, so the result is deterministic.
    pub fn best_grid(&self, count: usize, width: f64, height: f64) -> GridShape {
        if count == 0 || width <= 0.0 || height <= 0.0 {
            return GridShape { cols: 1, rows: 1 };
        }

        let mut best = GridShape { cols: 1, rows: count };
        let mut best_score = f64::NEG_INFINITY;

        for cols in 1..=count {
            let rows = count.div_ceil(cols);
            if rows == 0 {
                continue;
            }
            let cell_width = width / cols as f64;
            let cell_height = height / rows as f64;
            let score = self.score(cell_width, cell_height);
            if score > best_score {
                best_score = score;
                best = GridShape { cols, rows };
            }
        }

        best
    }

    /// Computes tile geometry for `count` tiles in `viewport`.
    ///
    /// # Algorithm
    /// 1. Pick `(cols, rows)` with [`best_grid`](Self::best_grid).
    /// 2. Size tiles width-first from the cell width minus the gap.
    /// 3. If the stacked rows overflow vertically, size from height instead.
    /// 4. Centre the `cols x rows` block in the content box.
    ///
    /// Degenerate input (no tiles, or an empty content box) yields a single
    /// cell spanning the content box for every tile.
    pub fn compute(&self, count: usize, viewport: Viewport) -> ComparisonLayoutResult {
        let (width, height) = self.content_area(viewport);

        if count == 0 || width <= 0.0 || height <= 0.0 {
            let full = TileGeometry::new(0.0, 0.0, width.max(0.0), height.max(0.0));
            return ComparisonLayoutResult {
                cols: 1,
                rows: 1,
                tile_width: full.width,
                tile_height: full.height,
                offset_x: 0.0,
                offset_y: 0.0,
                tiles: vec![full; count],
            };
        }

        let GridShape { cols, rows } = self.best_grid(count, width, height);
        let (tile_width, tile_height) = self.tile_size(cols, rows, width, height);

        let block_width = cols as f64 * tile_width + (cols - 1) as f64 * self.gap;
        let block_height = rows as f64 * tile_height + (rows - 1) as f64 * self.gap;
        let offset_x = (width - block_width) / 2.0;
        let offset_y = (height - block_height) / 2.0;

        let tiles = (0..count)
            .map(|i| {
                let row = i / cols;
                let col = i % cols;
                TileGeometry::new(
                    offset_x + col as f64 * (tile_width + self.gap),
                    offset_y + row as f64 * (tile_height + self.gap),
                    tile_width,
                    tile_height,
                )
            })
            .collect();

        ComparisonLayoutResult {
            cols,
            rows,
            tile_width,
            tile_height,
            offset_x,
            offset_y,
            tiles,
        }
    }

    fn tile_size(&self, cols: usize, rows: usize, width: f64, height: f64) -> (f64, f64) {
        let gaps_y = (rows - 1) as f64 * self.gap;
        let cell_width = width / cols as f64;

        let mut tile_width = (cell_width - self.gap).max(0.0);
        let mut tile_height = tile_width / self.target_aspect;

        if rows as f64 * tile_height + gaps_y > height {
            tile_height = ((height - gaps_y) / rows as f64).max(0.0);
            tile_width = tile_height * self.target_aspect;
        }

        (tile_width, tile_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_margins() -> ComparisonLayout {
        ComparisonLayout::new(DEFAULT_TARGET_ASPECT, 16.0, 0.0, 0.0, 0.0)
    }

    #[test]
    fn test_best_grid_is_deterministic() {
        let layout = ComparisonLayout::default();
        for count in 1..12 {
            let a = layout.best_grid(count, 1400.0, 900.0);
            let b = layout.best_grid(count, 1400.0, 900.0);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_grid_covers_count() {
        let layout = ComparisonLayout::default();
        for count in 1..40 {
            for (w, h) in [(1920.0, 1080.0), (800.0, 1200.0), (300.0, 200.0), (5000.0, 100.0)] {
                let GridShape { cols, rows } = layout.best_grid(count, w, h);
                assert!(cols >= 1 && rows >= 1);
                assert!(cols * rows >= count, "{}x{} < {}", cols, rows, count);
            }
        }
    }

    #[test]
    fn test_degenerate_fallback() {
        let layout = no_margins();

        let empty = layout.compute(0, Viewport::new(1200.0, 800.0));
        assert_eq!(empty.shape(), GridShape { cols: 1, rows: 1 });
        assert!(empty.tiles.is_empty());
        assert_eq!(empty.tile_width, 1200.0);
        assert_eq!(empty.tile_height, 800.0);

        let zero_width = layout.compute(3, Viewport::new(0.0, 800.0));
        assert_eq!(zero_width.shape(), GridShape { cols: 1, rows: 1 });
        assert_eq!(zero_width.tiles.len(), 3);
        for tile in &zero_width.tiles {
            assert_eq!(*tile, TileGeometry::new(0.0, 0.0, 0.0, 800.0));
        }

        let negative = layout.compute(2, Viewport::new(640.0, -5.0));
        assert_eq!(negative.tiles[0], TileGeometry::new(0.0, 0.0, 640.0, 0.0));

        assert_eq!(layout.best_grid(0, 100.0, 100.0), GridShape { cols: 1, rows: 1 });
        assert_eq!(layout.best_grid(4, -1.0, 100.0), GridShape { cols: 1, rows: 1 });
    }

    #[test]
    fn test_margins_shrink_content_box() {
        let layout = ComparisonLayout::default();
        // 64 + 64 vertical margins eat the whole height
        let result = layout.compute(2, Viewport::new(1000.0, 128.0));
        assert_eq!(result.shape(), GridShape { cols: 1, rows: 1 });
        assert_eq!(result.tiles[0].height, 0.0);
        assert_eq!(result.tiles[0].width, 936.0);
    }

    #[test]
    fn test_four_tiles_in_1200x800_beats_every_alternative() {
        let layout = no_margins();
        let (w, h) = (1200.0, 800.0);
        let chosen = layout.best_grid(4, w, h);
        assert!(chosen.cols * chosen.rows >= 4);

        let chosen_score = layout.score(w / chosen.cols as f64, h / chosen.rows as f64);
        for cols in 1..=4usize {
            for rows in 1..=4usize {
                if cols * rows < 4 {
                    continue;
                }
                let score = layout.score(w / cols as f64, h / rows as f64);
                assert!(
                    score <= chosen_score,
                    "{}x{} scores {} over chosen {:?} at {}",
                    cols,
                    rows,
                    score,
                    chosen,
                    chosen_score
                );
            }
        }
        assert_eq!(chosen, GridShape { cols: 4, rows: 1 });
    }

    #[test]
    fn test_tiles_keep_target_aspect_and_fit() {
        let layout = ComparisonLayout::default();
        let viewport = Viewport::new(1600.0, 1000.0);
        let (w, h) = layout.content_area(viewport);

        for count in 1..10 {
            let result = layout.compute(count, viewport);
            assert_eq!(result.tiles.len(), count);
            let ratio = result.tile_width / result.tile_height;
            assert!((ratio - DEFAULT_TARGET_ASPECT).abs() < 1e-9);
            for tile in &result.tiles {
                assert!(tile.x >= -1e-9 && tile.y >= -1e-9, "{:?}", tile);
                assert!(tile.right() <= w + 1e-9, "{:?} exceeds {}", tile, w);
                assert!(tile.bottom() <= h + 1e-9, "{:?} exceeds {}", tile, h);
            }
        }
    }

    #[test]
    fn test_height_binds_when_width_first_overflows() {
        let layout = no_margins();
        // One wide, short cell: width-first sizing would be far too tall.
        let result = layout.compute(1, Viewport::new(2000.0, 300.0));
        assert_eq!(result.shape(), GridShape { cols: 1, rows: 1 });
        assert!((result.tile_height - 300.0).abs() < 1e-9);
        assert!((result.tile_width - 300.0 * DEFAULT_TARGET_ASPECT).abs() < 1e-9);
        // Centred horizontally
        assert!((result.offset_x * 2.0 + result.tile_width - 2000.0).abs() < 1e-9);
        assert!(result.offset_y.abs() < 1e-9);
    }

    #[test]
    fn test_row_major_placement() {
        let layout = no_margins();
        let result = layout.compute(5, Viewport::new(900.0, 900.0));
        let cols = result.cols;
        for (i, tile) in result.tiles.iter().enumerate() {
            let row = i / cols;
            let col = i % cols;
            assert!((tile.x - (result.offset_x + col as f64 * (result.tile_width + 16.0))).abs() < 1e-9);
            assert!((tile.y - (result.offset_y + row as f64 * (result.tile_height + 16.0))).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_and_nan_aspect_score_as_square() {
        let layout = ComparisonLayout::default();
        let square_penalty = (1.0 / layout.target_aspect).ln().abs();

        assert_eq!(layout.aspect_penalty(0.0, 240.0), square_penalty);
        assert_eq!(layout.aspect_penalty(0.0, 0.0), square_penalty);
        assert_eq!(layout.aspect_penalty(f64::NAN, 10.0), square_penalty);
        assert_eq!(layout.aspect_penalty(10.0, 10.0), square_penalty);

        assert_eq!(layout.score(0.0, 240.0), 0.0);
        assert_eq!(layout.score(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_square_target_prefers_balanced_grid() {
        let layout = ComparisonLayout::new(1.0, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(layout.best_grid(4, 100.0, 100.0), GridShape { cols: 2, rows: 2 });
        assert_eq!(layout.best_grid(9, 300.0, 300.0), GridShape { cols: 3, rows: 3 });
    }
}
