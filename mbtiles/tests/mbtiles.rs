use std::path::{Path, PathBuf};

use delling_mbtiles::{Mbtiles, Metadata, MetadataMap};
use futures::future::join_all;
use pretty_assertions::assert_eq;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection as _, Executor as _, SqliteConnection};
use tempfile::TempDir;

const SCHEMA: &str = "
    CREATE TABLE metadata (name text, value text);
    CREATE UNIQUE INDEX name ON metadata (name);
    CREATE TABLE tiles (zoom_level integer, tile_column integer, tile_row integer, tile_data blob);
    CREATE UNIQUE INDEX tile_index ON tiles (zoom_level, tile_column, tile_row);";

const METADATA: &str = "
    INSERT INTO metadata (name, value) VALUES
        ('name', 'Skagerrak')
      , ('format', 'png')
      , ('bounds', '7.5,57.0,11.0,59.5')
      , ('minzoom', 2)
      , ('maxzoom', 3)
      ;";

/// Every tile holds its own slippy address as text, e.g. `3/4/2`.
/// Rows are stored in the native convention: `2^z - 1 - y`.
fn tiles_sql() -> String {
    let mut values = Vec::new();
    for z in 2_u8..=3 {
        let size = 1_u32 << z;
        for x in 0..size {
            for y in 0..size {
                let row = size - 1 - y;
                values.push(format!("({z}, {x}, {row}, cast('{z}/{x}/{y}' as blob))"));
            }
        }
    }
    format!(
        "INSERT INTO tiles (zoom_level, tile_column, tile_row, tile_data) VALUES {};",
        values.join(", ")
    )
}

async fn new_file(dir: &Path) -> PathBuf {
    let path = dir.join("skagerrak.mbtiles");
    let opt = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&opt).await.unwrap();
    conn.execute(SCHEMA).await.unwrap();
    conn.execute(METADATA).await.unwrap();
    conn.execute(tiles_sql().as_str()).await.unwrap();
    conn.close().await.unwrap();
    path
}

#[actix_rt::test]
async fn concurrent_tile_reads() {
    let dir = TempDir::new().unwrap();
    let mbt = Mbtiles::new(new_file(dir.path()).await).unwrap();

    let mut coords = Vec::new();
    for z in 2_u8..=3 {
        for x in 0..(1_u32 << z) {
            for y in 0..(1_u32 << z) {
                coords.push((z, x, y));
            }
        }
    }
    let tiles = join_all(coords.iter().map(|&(z, x, y)| mbt.read_tile(z, x, y))).await;

    assert_eq!(tiles.len(), 16 + 64);
    for ((z, x, y), tile) in coords.into_iter().zip(tiles) {
        let tile = tile.unwrap().unwrap();
        assert_eq!(String::from_utf8(tile).unwrap(), format!("{z}/{x}/{y}"));
    }
}

#[actix_rt::test]
async fn concurrent_tile_and_metadata_reads() {
    let dir = TempDir::new().unwrap();
    let mbt = Mbtiles::new(new_file(dir.path()).await).unwrap();

    let metadata = join_all((0..8).map(|_| mbt.read_metadata_map()));
    let tiles = join_all((0..8).map(|i| mbt.read_tile(3, i, 7 - i)));
    let (metadata, tiles) = futures::join!(metadata, tiles);

    let expected = MetadataMap::from([
        ("bounds".to_string(), "7.5,57.0,11.0,59.5".to_string()),
        ("format".to_string(), "png".to_string()),
        ("maxzoom".to_string(), "3".to_string()),
        ("minzoom".to_string(), "2".to_string()),
        ("name".to_string(), "Skagerrak".to_string()),
    ]);
    for map in metadata {
        assert_eq!(map.unwrap(), expected);
    }
    for (i, tile) in tiles.into_iter().enumerate() {
        let tile = tile.unwrap().unwrap();
        assert_eq!(String::from_utf8(tile).unwrap(), format!("3/{i}/{}", 7 - i));
    }
}

#[actix_rt::test]
async fn typed_metadata() {
    let dir = TempDir::new().unwrap();
    let mbt = Mbtiles::new(new_file(dir.path()).await).unwrap();

    assert_eq!(mbt.filename(), "skagerrak");
    let meta = Metadata::from_map(mbt.filename(), mbt.read_metadata_map().await.unwrap());
    assert_eq!(meta.format_or_default(), "png");
    assert_eq!(meta.bounds.as_deref(), Some("7.5,57.0,11.0,59.5"));
    assert_eq!(meta.center, None);
    assert_eq!((meta.minzoom, meta.maxzoom), (Some(2), Some(3)));
}
