use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use delling_tile_utils::TileInfo;
use futures::TryStreamExt as _;
use sqlx::{SqliteExecutor, query_as};
use tracing::{debug, warn};

use crate::Mbtiles;
use crate::errors::MbtResult;

/// Raw `name -> value` content of the `metadata` table.
pub type MetadataMap = BTreeMap<String, String>;

/// `format` assumed when the metadata does not declare one.
pub const DEFAULT_FORMAT: &str = "png";
pub const DEFAULT_MIN_ZOOM: u8 = 0;
pub const DEFAULT_MAX_ZOOM: u8 = 18;

/// Typed view of the well-known metadata keys.
///
/// `bounds` and `center` are kept as opaque strings and passed through to clients unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    pub format: Option<String>,
    pub description: Option<String>,
    pub bounds: Option<String>,
    pub center: Option<String>,
    pub minzoom: Option<u8>,
    pub maxzoom: Option<u8>,
}

impl Metadata {
    /// Build the typed view of the metadata of the dataset `id`.
    /// Values that cannot be parsed are logged and dropped, other keys are ignored.
    #[must_use]
    pub fn from_map(id: &str, map: MetadataMap) -> Self {
        let mut res = Self::default();
        for (name, value) in map {
            match name.as_str() {
                "format" => res.format = Some(value),
                "description" => res.description = Some(value),
                "bounds" => res.bounds = Some(value),
                "center" => res.center = Some(value),
                "minzoom" => res.minzoom = to_val(id, &name, u8::from_str(value.trim())),
                "maxzoom" => res.maxzoom = to_val(id, &name, u8::from_str(value.trim())),
                _ => debug!("{id} has an unused metadata value {name}={value}"),
            }
        }
        res
    }

    /// Declared tile format, or [`DEFAULT_FORMAT`] if the metadata has none.
    #[must_use]
    pub fn format_or_default(&self) -> &str {
        self.format.as_deref().unwrap_or(DEFAULT_FORMAT)
    }

    /// Transport labelling of the tiles, `None` for formats this crate does not recognize.
    #[must_use]
    pub fn tile_info(&self) -> Option<TileInfo> {
        TileInfo::from_declared_format(self.format_or_default())
    }
}

fn to_val<V, E: Display>(id: &str, title: &str, val: Result<V, E>) -> Option<V> {
    match val {
        Ok(v) => Some(v),
        Err(err) => {
            warn!("Unable to parse metadata {title} value in {id}: {err}");
            None
        }
    }
}

impl Mbtiles {
    /// Read the whole `metadata` table on an already open connection.
    ///
    /// Values stored with a non-text type are returned in their text form. Rows with a NULL
    /// name or value are skipped.
    pub async fn get_metadata_map<T>(&self, conn: &mut T) -> MbtResult<MetadataMap>
    where
        for<'e> &'e mut T: SqliteExecutor<'e>,
    {
        let mut rows = query_as::<_, (Option<String>, Option<String>)>(
            "SELECT name, CAST(value AS TEXT) AS value FROM metadata",
        )
        .fetch(conn);

        let mut map = MetadataMap::new();
        while let Some(row) = rows.try_next().await? {
            if let (Some(name), Some(value)) = row {
                map.insert(name, value);
            }
        }
        Ok(map)
    }

    /// Open the file, read its `metadata` table, and close the file again.
    pub async fn read_metadata_map(&self) -> MbtResult<MetadataMap> {
        let mut conn = self.open_readonly().await?;
        let map = self.get_metadata_map(&mut conn).await;
        self.close(conn).await;
        map
    }
}
