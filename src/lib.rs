//! Side-by-side comparison of photo albums.
//!
//! Every queued album shows its image at one shared page index. The
//! [`layout`] solver picks the grid, [`navigation`] keeps all albums in
//! lockstep while their images load, and [`models`] holds the SQLite
//! catalog the albums and the saved queue live in.

pub mod app;
pub mod cli;
pub mod config;
pub mod image_loader;
pub mod layout;
pub mod models;
pub mod navigation;
pub mod scanner;
