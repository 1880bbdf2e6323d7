use std::ffi::OsStr;
use std::fmt::{Display, Formatter};
use std::path::Path;

use delling_tile_utils::{TileCoord, TileData};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection as _, SqliteConnection, SqliteExecutor, query_scalar};
use tracing::{debug, trace};

use crate::errors::{MbtError, MbtResult};

/// A handle to an `MBTiles` file on disk. Creating it does not touch the file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mbtiles {
    filepath: String,
    filename: String,
}

impl Display for Mbtiles {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.filepath)
    }
}

impl Mbtiles {
    pub fn new<P: AsRef<Path>>(filepath: P) -> MbtResult<Self> {
        let path = filepath.as_ref();
        Ok(Self {
            filepath: path
                .to_str()
                .ok_or_else(|| MbtError::UnsupportedCharsInFilepath(path.to_path_buf()))?
                .to_string(),
            filename: path
                .file_stem()
                .unwrap_or_else(|| OsStr::new("unknown"))
                .to_string_lossy()
                .to_string(),
        })
    }

    /// Open the file read-only. A missing file is an error; it is never created.
    pub async fn open_readonly(&self) -> MbtResult<SqliteConnection> {
        debug!("Opening as readonly {self}");
        let opt = SqliteConnectOptions::new()
            .filename(self.filepath())
            .create_if_missing(false)
            .read_only(true);
        Ok(SqliteConnection::connect_with(&opt).await?)
    }

    #[must_use]
    pub fn filepath(&self) -> &str {
        &self.filepath
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Look up a single tile on an already open connection.
    ///
    /// `xyz` is in the slippy convention and is converted to the native row here.
    pub async fn get_tile<T>(&self, conn: &mut T, xyz: TileCoord) -> MbtResult<Option<TileData>>
    where
        for<'e> &'e mut T: SqliteExecutor<'e>,
    {
        let y = xyz.native_y();
        trace!("Looking up tile {xyz:#} at native row {y} in {self}");
        let tile = query_scalar::<_, Option<Vec<u8>>>(
            "SELECT tile_data FROM tiles WHERE zoom_level = ? AND tile_column = ? AND tile_row = ?",
        )
        .bind(xyz.z)
        .bind(xyz.x)
        .bind(y)
        .fetch_optional(conn)
        .await?
        .flatten();
        Ok(tile)
    }

    /// Open the file, fetch one tile, and close the file again.
    ///
    /// * `Ok(Some(data))` if the tile is stored
    /// * `Ok(None)` if there is no tile at this address, including addresses outside of `[0, 2^z)`
    /// * `Err(_)` if the file could not be opened or queried
    pub async fn read_tile(&self, z: u8, x: u32, y: u32) -> MbtResult<Option<TileData>> {
        let Some(xyz) = TileCoord::new_checked(z, x, y) else {
            trace!("Tile {z}/{x}/{y} is outside of the tile pyramid of {self}");
            return Ok(None);
        };
        let mut conn = self.open_readonly().await?;
        let tile = self.get_tile(&mut conn, xyz).await;
        self.close(conn).await;
        tile
    }

    pub(crate) async fn close(&self, conn: SqliteConnection) {
        if let Err(err) = conn.close().await {
            debug!("Unable to cleanly close {self}: {err}");
        }
    }
}
