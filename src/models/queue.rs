use super::Album;

/// Albums selected for side-by-side comparison, in insertion order.
///
/// Albums are unique by id. A comparison session takes a snapshot of the
/// queue when it opens, so later edits never reach a running session.
#[derive(Debug, Clone, Default)]
pub struct ComparisonQueue {
    albums: Vec<Album>,
}

impl ComparisonQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from albums, dropping repeated ids.
    pub fn from_albums(albums: impl IntoIterator<Item = Album>) -> Self {
        let mut queue = Self::new();
        for album in albums {
            queue.add(album);
        }
        queue
    }

    /// Returns false if an album with the same id is already queued.
    pub fn add(&mut self, album: Album) -> bool {
        if self.contains(&album.id) {
            return false;
        }
        self.albums.push(album);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<Album> {
        let pos = self.albums.iter().position(|a| a.id == id)?;
        Some(self.albums.remove(pos))
    }

    /// Add the album if absent, otherwise remove it. Returns true if the
    /// album is queued afterwards.
    pub fn toggle(&mut self, album: Album) -> bool {
        if self.remove(&album.id).is_some() {
            false
        } else {
            self.albums.push(album);
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.albums.iter().any(|a| a.id == id)
    }

    pub fn clear(&mut self) {
        self.albums.clear();
    }

    pub fn len(&self) -> usize {
        self.albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.albums.iter().map(|a| a.id.as_str())
    }

    /// Highest page index any queued album can show.
    pub fn max_index(&self) -> Option<usize> {
        max_index(&self.albums)
    }
}

/// `max(image count) - 1`, or `None` when no album has any images.
pub fn max_index(albums: &[Album]) -> Option<usize> {
    albums
        .iter()
        .map(Album::image_count)
        .max()
        .and_then(|n| n.checked_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(id: &str, images: usize) -> Album {
        Album::new(
            id,
            id.to_uppercase(),
            (0..images).map(|i| format!("{}/{}.jpg", id, i)).collect(),
        )
    }

    #[test]
    fn test_unique_by_id() {
        let mut queue = ComparisonQueue::new();
        assert!(queue.add(album("a", 1)));
        assert!(queue.add(album("b", 2)));
        assert!(!queue.add(album("a", 5)));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.albums()[0].image_count(), 1);
    }

    #[test]
    fn test_toggle_and_remove() {
        let mut queue = ComparisonQueue::from_albums([album("a", 1), album("b", 1), album("a", 1)]);
        assert_eq!(queue.ids().collect::<Vec<_>>(), vec!["a", "b"]);

        assert!(!queue.toggle(album("a", 1)));
        assert_eq!(queue.ids().collect::<Vec<_>>(), vec!["b"]);
        assert!(queue.toggle(album("c", 1)));
        assert_eq!(queue.ids().collect::<Vec<_>>(), vec!["b", "c"]);
        assert!(queue.remove("zzz").is_none());
    }

    #[test]
    fn test_max_index() {
        let queue = ComparisonQueue::from_albums([album("a", 1), album("b", 3), album("c", 5)]);
        assert_eq!(queue.max_index(), Some(4));

        let empty = ComparisonQueue::from_albums([album("a", 0), album("b", 0)]);
        assert_eq!(empty.max_index(), None);
        assert_eq!(ComparisonQueue::new().max_index(), None);
    }
}
