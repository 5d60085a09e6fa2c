/// Pixel rectangle of one comparison tile.
///
/// Coordinates are relative to the content box, i.e. the viewport with the
/// fixed margins already removed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TileGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl TileGeometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Translate into window coordinates.
    pub fn absolute(&self, left: f64, top: f64) -> Self {
        Self {
            x: self.x + left,
            y: self.y + top,
            ..*self
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Window or container size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An image that finished loading and can be painted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Visible state of one tile in the comparison grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileState {
    /// The album has no images to show.
    Empty,
    /// A load for `url` is in flight.
    Pending { url: String },
    Loaded(LoadedImage),
    /// The load settled with an error; the tile shows a placeholder.
    Failed { url: String, reason: String },
}

impl TileState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending { .. })
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Pending { url } | Self::Failed { url, .. } => Some(url),
            Self::Loaded(image) => Some(&image.url),
        }
    }
}
