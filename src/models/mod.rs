pub mod album;
pub mod album_store;
pub mod queue;
pub mod tile;

pub use album::*;
pub use album_store::*;
pub use queue::*;
pub use tile::*;
