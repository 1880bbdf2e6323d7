#![doc = include_str!("../README.md")]

// Re-export sqlx so that callers can inspect database errors and build test fixtures
pub use sqlx;

mod errors;
pub use errors::{MbtError, MbtResult};

mod mbtiles;
pub use mbtiles::Mbtiles;

mod metadata;
pub use metadata::{DEFAULT_FORMAT, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, Metadata, MetadataMap};
