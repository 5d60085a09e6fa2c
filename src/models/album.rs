use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormatHint {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
    Tiff,
}

impl ImageFormatHint {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            "bmp" => Some(Self::Bmp),
            "tiff" | "tif" => Some(Self::Tiff),
            _ => None,
        }
    }
}

/// A named, ordered collection of image URLs.
///
/// The serialized shape matches the document store the albums originate
/// from: `_id` (or `id`), `title`, `imageUrls`, `description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(rename = "imageUrls", default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl Album {
    pub fn new(id: impl Into<String>, title: impl Into<String>, image_urls: Vec<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_urls,
            description: String::new(),
        }
    }

    /// Builds a new album from user-entered URLs.
    ///
    /// URLs are trimmed, blank lines dropped and `http://` upgraded to
    /// `https://`. The id is derived from the title and image list, so adding
    /// the same album twice updates it instead of duplicating it.
    pub fn create<I, S>(title: &str, description: &str, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let title = title.trim();
        let image_urls: Vec<String> = urls
            .into_iter()
            .map(|url| normalize_image_url(url.as_ref()))
            .filter(|url| !url.is_empty())
            .collect();

        let mut data = Vec::with_capacity(256);
        data.extend_from_slice(title.as_bytes());
        for url in &image_urls {
            data.push(0);
            data.extend_from_slice(url.as_bytes());
        }

        Self::new(format!("{:016x}", xxh3_64(&data)), title, image_urls)
            .with_description(description.trim())
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn image_count(&self) -> usize {
        self.image_urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_urls.is_empty()
    }

    /// Image shown for a shared page index; wraps around shorter albums.
    pub fn image_at(&self, index: usize) -> Option<(usize, &str)> {
        if self.image_urls.is_empty() {
            return None;
        }
        let image_index = index % self.image_urls.len();
        Some((image_index, self.image_urls[image_index].as_str()))
    }

    /// First image, used as the album cover.
    pub fn cover_url(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }

    /// Parse a JSON array of album documents.
    pub fn list_from_json(json: &str) -> serde_json::Result<Vec<Album>> {
        serde_json::from_str(json)
    }
}

/// Trims `url` and rewrites a leading `http://` (any case) to `https://`.
pub fn normalize_image_url(url: &str) -> String {
    let url = url.trim();
    match url.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("http://") => format!("https://{}", &url[7..]),
        _ => url.to_string(),
    }
}
