use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use delling_mbtiles::{
    DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, MbtResult, Mbtiles, Metadata, MetadataMap,
};
use delling_tile_utils::{TileData, TileInfo};
use futures::future::join_all;
use serde::Serialize;
use tokio::task::spawn_blocking;
use tracing::{debug, warn};

use crate::datasets::DatasetLocator;

/// File name suffix of the datasets, matched case-sensitively.
pub const DATASET_EXTENSION: &str = ".mbtiles";

/// A dataset file found in the dataset directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetFile {
    pub name: String,
    pub path: PathBuf,
}

impl DatasetFile {
    /// Read one tile, addressed with the slippy-map row.
    pub async fn read_tile(&self, z: u8, x: u32, y: u32) -> MbtResult<Option<TileData>> {
        Mbtiles::new(&self.path)?.read_tile(z, x, y).await
    }

    /// Transport labelling of the tiles, from the declared `format`.
    /// `None` if the format is not recognized.
    pub async fn tile_info(&self) -> Option<TileInfo> {
        let map = DatasetRegistry::get_metadata(&self.path).await;
        Metadata::from_map(&self.name, map).tile_info()
    }
}

/// Description of a dataset as reported by `/api/tilesets`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Dataset {
    pub name: String,
    pub format: String,
    pub description: String,
    pub bounds: String,
    pub center: String,
    pub minzoom: u8,
    pub maxzoom: u8,
}

/// Enumerates the datasets on the removable media.
///
/// Every call looks at the filesystem again, so media plugged in after start-up is picked up
/// by the next request.
#[derive(Clone, Debug)]
pub struct DatasetRegistry {
    locator: DatasetLocator,
}

impl DatasetRegistry {
    #[must_use]
    pub fn new(locator: DatasetLocator) -> Self {
        Self { locator }
    }

    /// The current dataset directory, if any media holding one is mounted.
    pub async fn locate(&self) -> Option<PathBuf> {
        let locator = self.locator.clone();
        spawn_blocking(move || locator.locate()).await.unwrap_or_else(|e| {
            warn!("Dataset directory lookup failed: {e}");
            None
        })
    }

    /// All datasets by name. Empty if there is no dataset directory.
    ///
    /// The directory scan runs on the blocking thread pool, so slow media never stalls a worker.
    pub async fn list_datasets(&self) -> BTreeMap<String, DatasetFile> {
        let locator = self.locator.clone();
        spawn_blocking(move || scan_datasets(&locator)).await.unwrap_or_else(|e| {
            warn!("Dataset directory scan failed: {e}");
            BTreeMap::new()
        })
    }

    /// Find a dataset by name in the current listing.
    pub async fn resolve(&self, name: &str) -> Option<DatasetFile> {
        self.list_datasets().await.remove(name)
    }

    /// The raw `metadata` table of a dataset. Empty if it cannot be read for any reason.
    pub async fn get_metadata(path: &Path) -> MetadataMap {
        let map = match Mbtiles::new(path) {
            Ok(mbt) => mbt.read_metadata_map().await,
            Err(e) => Err(e),
        };
        map.unwrap_or_else(|e| {
            warn!("Unable to read metadata from {}: {e}", path.display());
            MetadataMap::new()
        })
    }

    /// Read the metadata of a dataset and fill in the defaults.
    pub async fn describe(file: &DatasetFile) -> Dataset {
        let map = Self::get_metadata(&file.path).await;
        let meta = Metadata::from_map(&file.name, map);
        Dataset {
            format: meta.format_or_default().to_string(),
            description: meta.description.unwrap_or_else(|| file.name.clone()),
            bounds: meta.bounds.unwrap_or_default(),
            center: meta.center.unwrap_or_default(),
            minzoom: meta.minzoom.unwrap_or(DEFAULT_MIN_ZOOM),
            maxzoom: meta.maxzoom.unwrap_or(DEFAULT_MAX_ZOOM),
            name: file.name.clone(),
        }
    }

    /// Describe every dataset, in name order. Metadata of all files is read concurrently.
    pub async fn describe_all(&self) -> Vec<Dataset> {
        let datasets = self.list_datasets().await;
        join_all(datasets.values().map(Self::describe)).await
    }
}

/// Blocking scan of the dataset directory, by name.
fn scan_datasets(locator: &DatasetLocator) -> BTreeMap<String, DatasetFile> {
    let mut datasets = BTreeMap::new();
    let Some(dir) = locator.locate() else {
        debug!("No dataset directory found in {:?}", locator.candidates());
        return datasets;
    };
    for path in list_dataset_paths(&dir) {
        let Some(name) = dataset_name(&path) else {
            continue;
        };
        let file = DatasetFile {
            name: name.to_string(),
            path,
        };
        if let Some(prev) = datasets.insert(file.name.clone(), file) {
            debug!(
                "Dataset {} from {} is shadowed by a later file with the same name",
                prev.name,
                prev.path.display()
            );
        }
    }
    datasets
}

/// Regular `*.mbtiles` files in `dir`, hidden files excluded, sorted by path.
fn list_dataset_paths(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Unable to list dataset directory {}: {e}", dir.display());
            return Vec::new();
        }
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                debug!("Unable to read an entry of {}: {e}", dir.display());
                None
            }
        })
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with('.') && n.ends_with(DATASET_EXTENSION))
        })
        .filter(|path| path.is_file())
        .collect();
    paths.sort();
    paths
}

fn dataset_name(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()?.strip_suffix(DATASET_EXTENSION)
}
