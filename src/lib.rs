//! Image viewer core: playlist of files and archive entries, a shared
//! byte cache filled ahead of the cursor, and the decode, spread and
//! resample pipeline that feeds the window.

pub mod archive;
pub mod cache;
pub mod composite;
pub mod config;
pub mod error;
pub mod file_ref;
pub mod files;
pub mod loader;
pub mod playlist;
pub mod prefetch;
pub mod raster;
pub mod resample;
pub mod view;
