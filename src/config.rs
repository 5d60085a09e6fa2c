use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::layout::ComparisonLayout;
use crate::models::Viewport;

const DEFAULT_VIEWPORT: Viewport = Viewport {
    width: 1920.0,
    height: 1080.0,
};

/// Settings resolved from the environment, before CLI overrides.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub layout: ComparisonLayout,
    pub viewport: Viewport,
    /// Catalog path; `None` means the XDG default.
    pub db_path: Option<PathBuf>,
}

impl AppConfig {
    /// Reads `ALBUMCMP_*` variables, falling back to defaults for anything
    /// unset or unparsable.
    pub fn from_env() -> Self {
        let mut layout = ComparisonLayout::default();
        if let Some(aspect) = env_f64("ALBUMCMP_TARGET_ASPECT").filter(|v| *v > 0.0) {
            layout.target_aspect = aspect;
        }
        if let Some(gap) = env_f64("ALBUMCMP_TILE_GAP").filter(|v| *v >= 0.0) {
            layout.gap = gap;
        }

        let viewport = std::env::var("ALBUMCMP_VIEWPORT")
            .ok()
            .and_then(|v| parse_viewport(&v).ok())
            .unwrap_or(DEFAULT_VIEWPORT);

        let db_path = std::env::var_os("ALBUMCMP_DB")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            layout,
            viewport,
            db_path,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            layout: ComparisonLayout::default(),
            viewport: DEFAULT_VIEWPORT,
            db_path: None,
        }
    }
}

fn env_f64(name: &str) -> Option<f64> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parses `WIDTHxHEIGHT`, e.g. `1920x1080`.
pub fn parse_viewport(value: &str) -> Result<Viewport> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .with_context(|| format!("Viewport must look like 1920x1080, got {:?}", value))?;
    let width = w
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid viewport width {:?}", w))?;
    let height = h
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid viewport height {:?}", h))?;
    if !(width.is_finite() && height.is_finite()) {
        bail!("Viewport dimensions must be finite, got {:?}", value);
    }
    Ok(Viewport::new(width, height))
}
