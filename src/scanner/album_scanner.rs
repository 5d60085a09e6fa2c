//! Builds albums from a directory tree.
//!
//! Every directory that directly contains image files becomes one album:
//! - id: xxh3 of the directory path, as 16 hex digits
//! - title: the directory name
//! - images: `file://` URLs, sorted by path
//! - description: the directory path relative to the scan root

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tokio::task;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use xxhash_rust::xxh3::xxh3_64;

use crate::image_loader::file_url;
use crate::models::{Album, ImageFormatHint};

/// Configuration for the album scanner.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Maximum directory depth (0 = unlimited).
    pub max_depth: usize,
    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,
    /// Skip directories whose name starts with a dot.
    pub skip_hidden: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 0,
            follow_symlinks: false,
            skip_hidden: true,
        }
    }
}

/// Async directory scanner producing album snapshots.
pub struct AlbumScanner {
    config: ScanConfig,
}

impl AlbumScanner {
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Scans `root` on the blocking pool.
    pub async fn scan(&self, root: &Path) -> Result<Vec<Album>> {
        let root = root.to_path_buf();
        let config = self.config.clone();
        task::spawn_blocking(move || Self::scan_sync(&root, &config))
            .await
            .context("Scan task panicked")?
    }

    fn scan_sync(root: &Path, config: &ScanConfig) -> Result<Vec<Album>> {
        if !root.is_dir() {
            bail!("Not a directory: {:?}", root);
        }
        info!("Scanning {:?} for albums", root);

        let mut walker = WalkDir::new(root).follow_links(config.follow_symlinks);
        if config.max_depth > 0 {
            walker = walker.max_depth(config.max_depth);
        }

        let skip_hidden = config.skip_hidden;
        let entries = walker.into_iter().filter_entry(move |e| {
            !(skip_hidden && e.depth() > 0 && is_hidden(e.file_name().to_str()))
        });

        // Directory -> image paths found directly inside it
        let mut groups: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ImageFormatHint::from_extension(ext).is_none() {
                continue;
            }

            let Some(parent) = path.parent() else {
                continue;
            };
            groups
                .entry(parent.to_path_buf())
                .or_default()
                .push(path.to_path_buf());
        }

        let albums: Vec<Album> = groups
            .into_iter()
            .map(|(dir, mut images)| {
                images.sort();
                Self::album_for(root, &dir, &images)
            })
            .collect();

        info!("Found {} albums", albums.len());
        Ok(albums)
    }

    fn album_for(root: &Path, dir: &Path, images: &[PathBuf]) -> Album {
        let title = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.to_string_lossy().into_owned());
        let relative = dir
            .strip_prefix(root)
            .ok()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string());

        debug!(dir = ?dir, images = images.len(), "Album discovered");

        Album::new(
            album_id(dir),
            title,
            images.iter().map(|p| file_url(p)).collect(),
        )
        .with_description(relative)
    }
}

impl Default for AlbumScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable album id for a directory.
pub fn album_id(dir: &Path) -> String {
    format!("{:016x}", xxh3_64(dir.as_os_str().as_encoded_bytes()))
}

fn is_hidden(name: Option<&str>) -> bool {
    name.is_some_and(|n| n.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::tempdir;

    fn create_test_image(path: &Path) {
        RgbImage::from_pixel(2, 3, Rgb([10, 20, 30])).save(path).unwrap();
    }

    #[tokio::test]
    async fn test_groups_images_per_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("beach")).unwrap();
        fs::create_dir_all(root.join("hills/day")).unwrap();

        create_test_image(&root.join("beach/2.png"));
        create_test_image(&root.join("beach/1.png"));
        create_test_image(&root.join("hills/day/a.png"));
        fs::write(root.join("beach/notes.txt"), b"not an image").unwrap();
        fs::write(root.join("hills/readme.md"), b"# hills").unwrap();

        let albums = AlbumScanner::new().scan(root).await.unwrap();
        assert_eq!(albums.len(), 2);

        let beach = albums.iter().find(|a| a.title == "beach").unwrap();
        assert_eq!(
            beach.image_urls,
            vec![
                file_url(&root.join("beach/1.png")),
                file_url(&root.join("beach/2.png"))
            ]
        );
        assert_eq!(beach.description, "beach");
        assert_eq!(beach.id, album_id(&root.join("beach")));

        let day = albums.iter().find(|a| a.title == "day").unwrap();
        assert_eq!(day.image_count(), 1);
    }

    #[tokio::test]
    async fn test_ids_are_stable_across_scans() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("x")).unwrap();
        create_test_image(&dir.path().join("x/1.png"));

        let first = AlbumScanner::new().scan(dir.path()).await.unwrap();
        let second = AlbumScanner::new().scan(dir.path()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_hidden_and_depth_limits() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        create_test_image(&root.join(".cache/thumb.png"));
        create_test_image(&root.join("a/top.png"));
        create_test_image(&root.join("a/b/c/deep.png"));

        let albums = AlbumScanner::new().scan(root).await.unwrap();
        let titles: Vec<_> = albums.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "c"]);

        let shallow = AlbumScanner::with_config(ScanConfig {
            max_depth: 2,
            ..ScanConfig::default()
        })
        .scan(root)
        .await
        .unwrap();
        assert_eq!(shallow.len(), 1);
        assert_eq!(shallow[0].title, "a");
    }

    #[tokio::test]
    async fn test_scan_missing_root_fails() {
        let dir = tempdir().unwrap();
        assert!(AlbumScanner::new().scan(&dir.path().join("nope")).await.is_err());
    }
}
