#![allow(clippy::missing_panics_doc)]
#![allow(clippy::new_without_default)]
#![allow(dead_code)]

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use delling_map::config::Config;
use delling_map::config::env::FauxEnv;
use delling_mbtiles::sqlx::sqlite::SqliteConnectOptions;
use delling_mbtiles::sqlx::{Connection as _, Executor as _, SqliteConnection, query};
use tempfile::TempDir;

/// Parse and finalize a test config. Unrecognized keys fail the test.
#[must_use]
pub fn mock_cfg(yaml: &str) -> Config {
    let mut cfg: Config = subst::yaml::from_str(yaml, &FauxEnv::default()).unwrap();
    let res = cfg.finalize().unwrap();
    assert!(res.is_empty(), "unrecognized config: {res:?}");
    cfg
}

/// A removable-media mount point inside a temp dir.
pub struct Media {
    pub tmp: TempDir,
}

impl Media {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().unwrap(),
        }
    }

    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.tmp.path().join("usb")
    }

    /// Create the dataset directory with the given casing and return it.
    pub fn maps_dir(&self, name: &str) -> PathBuf {
        let dir = self.root().join(name);
        create_dir_all(&dir).unwrap();
        dir
    }

    /// Config pointing at this media root with a short upstream timeout.
    #[must_use]
    pub fn config(&self, upstream: &str) -> Config {
        mock_cfg(&format!(
            "removable_media_root: {}\n\
             upstream_live_position_url: {upstream}\n\
             upstream_timeout: 300ms\n",
            self.root().display()
        ))
    }
}

/// Create an `MBTiles` file. Tile rows are given in the native (TMS) convention.
pub async fn new_dataset(
    dir: &Path,
    file_name: &str,
    metadata: &[(&str, &str)],
    tiles: &[(u8, u32, u32, &[u8])],
) -> PathBuf {
    let path = dir.join(file_name);
    let opt = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&opt).await.unwrap();
    conn.execute(
        "CREATE TABLE metadata (name text, value text);
         CREATE TABLE tiles (zoom_level integer, tile_column integer, tile_row integer, tile_data blob);
         CREATE UNIQUE INDEX tile_index on tiles (zoom_level, tile_column, tile_row);",
    )
    .await
    .unwrap();
    for (name, value) in metadata {
        query("INSERT INTO metadata (name, value) VALUES (?, ?)")
            .bind(*name)
            .bind(*value)
            .execute(&mut conn)
            .await
            .unwrap();
    }
    for (z, x, y, data) in tiles {
        query("INSERT INTO tiles VALUES (?, ?, ?, ?)")
            .bind(*z)
            .bind(*x)
            .bind(*y)
            .bind(*data)
            .execute(&mut conn)
            .await
            .unwrap();
    }
    conn.close().await.unwrap();
    path
}
