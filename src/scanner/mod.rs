//! Album discovery for the comparison catalog.

pub mod album_scanner;

pub use album_scanner::{AlbumScanner, ScanConfig};
