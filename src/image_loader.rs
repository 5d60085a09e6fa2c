use std::future::Future;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use image::{ImageFormat, ImageReader};
use tracing::trace;

use crate::models::LoadedImage;

/// Asynchronous image fetch used by comparison sessions.
///
/// Loads may complete in any order and at any time; callers must not assume
/// anything about relative timing between concurrent calls.
pub trait ImageLoader: Send + Sync + 'static {
    fn load(&self, url: &str) -> impl Future<Output = Result<LoadedImage>> + Send;
}

/// Loads `file://` URLs and plain paths from the local filesystem.
///
/// Decoding runs on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct FsImageLoader;

impl FsImageLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ImageLoader for FsImageLoader {
    async fn load(&self, url: &str) -> Result<LoadedImage> {
        let path = path_from_url(url)?;
        let owned_url = url.to_string();

        let (width, height) = tokio::task::spawn_blocking(move || read_dimensions(&path))
            .await
            .context("Image header task panicked")??;

        trace!(url = %owned_url, width, height, "Read image dimensions");
        Ok(LoadedImage {
            url: owned_url,
            width,
            height,
        })
    }
}

/// Resolves a `file://` URL or a bare path to a filesystem path.
pub fn path_from_url(url: &str) -> Result<PathBuf> {
    if let Some(rest) = url.strip_prefix("file://") {
        // file://localhost/tmp/a.png and file:///tmp/a.png
        let rest = rest.strip_prefix("localhost").unwrap_or(rest);
        if rest.is_empty() {
            bail!("Empty file URL: {}", url);
        }
        return Ok(PathBuf::from(rest));
    }

    if url.contains("://") {
        bail!("Unsupported image URL scheme: {}", url);
    }

    if url.is_empty() {
        bail!("Empty image URL");
    }

    Ok(PathBuf::from(url))
}

/// Whether [`FsImageLoader`] can load `url` at all.
pub fn is_local_url(url: &str) -> bool {
    path_from_url(url).is_ok()
}

/// Formats a path as the `file://` URL stored in albums.
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Reads width and height from the image header without decoding pixels.
///
/// GIFs are measured from their first frame.
pub fn read_dimensions(path: &Path) -> Result<(u32, u32)> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image: {:?}", path))?;
    let format = image::guess_format(&bytes).ok();

    if format == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(Cursor::new(bytes))
            .with_context(|| format!("Failed to decode GIF: {:?}", path))?;
        let mut frames = decoder.into_frames();
        if let Some(frame) = frames.next() {
            let buffer = frame.context("Failed to decode GIF frame")?.into_buffer();
            return Ok((buffer.width(), buffer.height()));
        }
        return Err(anyhow!("GIF has no frames: {:?}", path));
    }

    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("Failed to guess image format")?
        .into_dimensions()
        .with_context(|| format!("Failed to read dimensions: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn test_path_from_url() {
        assert_eq!(path_from_url("file:///tmp/a.png").unwrap(), PathBuf::from("/tmp/a.png"));
        assert_eq!(
            path_from_url("file://localhost/tmp/a.png").unwrap(),
            PathBuf::from("/tmp/a.png")
        );
        assert_eq!(path_from_url("pics/b.jpg").unwrap(), PathBuf::from("pics/b.jpg"));
        assert!(path_from_url("https://example.com/a.jpg").is_err());
        assert!(path_from_url("file://").is_err());
        assert!(path_from_url("").is_err());
    }

    #[test]
    fn test_is_local_url() {
        assert!(is_local_url("file:///tmp/a.png"));
        assert!(is_local_url("pics/b.jpg"));
        assert!(!is_local_url("https://example.com/a.jpg"));
    }

    #[tokio::test]
    async fn test_fs_loader_reads_dimensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("red.png");
        RgbImage::from_pixel(7, 3, Rgb([255, 0, 0])).save(&path).unwrap();

        let url = file_url(&path);
        let image = FsImageLoader::new().load(&url).await.unwrap();
        assert_eq!(image.url, url);
        assert_eq!((image.width, image.height), (7, 3));
    }

    #[test]
    fn test_read_dimensions_of_gif_and_png() {
        let dir = tempdir().unwrap();
        let gif = dir.path().join("anim.gif");
        RgbaImage::from_pixel(5, 9, Rgba([0, 0, 255, 255])).save(&gif).unwrap();
        assert_eq!(read_dimensions(&gif).unwrap(), (5, 9));

        let png = dir.path().join("wide.png");
        RgbImage::from_pixel(40, 2, Rgb([0, 255, 0])).save(&png).unwrap();
        assert_eq!(read_dimensions(&png).unwrap(), (40, 2));
    }

    #[tokio::test]
    async fn test_fs_loader_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        assert!(FsImageLoader::new().load(&file_url(&missing)).await.is_err());

        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();
        assert!(FsImageLoader::new().load(&file_url(&garbage)).await.is_err());
    }
}
