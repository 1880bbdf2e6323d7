use std::fs;
use std::iter;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

pub const MEDIA_ROOT_DEFAULT: &str = "/media/usb";
/// Directory under which desktop automounters create `<user>/usb`.
pub const USER_MEDIA_DIR_DEFAULT: &str = "/media";
/// Mount point name of the media, both at the root and under a user's directory.
const MEDIA_MOUNT_NAME: &str = "usb";
/// Name of the dataset directory on the media, matched case-insensitively.
pub const DATASET_DIR_NAME: &str = "maps";

/// Where removable media is expected to be mounted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaConfig {
    pub root: PathBuf,
    /// If set, `<user_media_dir>/<user>/usb` is searched after `root`,
    /// which is where desktop automounters put the media.
    pub user: Option<String>,
    pub user_media_dir: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(MEDIA_ROOT_DEFAULT),
            user: None,
            user_media_dir: PathBuf::from(USER_MEDIA_DIR_DEFAULT),
        }
    }
}

/// Finds the dataset directory on mounted media.
///
/// Nothing is cached: media can be plugged in or removed at any time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetLocator {
    candidates: Vec<PathBuf>,
}

impl DatasetLocator {
    #[must_use]
    pub fn new(config: MediaConfig) -> Self {
        let user_root = config
            .user
            .as_deref()
            .filter(|user| !user.is_empty())
            .map(|user| config.user_media_dir.join(user).join(MEDIA_MOUNT_NAME))
            .filter(|user_root| *user_root != config.root);
        let candidates = iter::once(config.root).chain(user_root).collect();
        Self { candidates }
    }

    /// Mount roots that are searched, in order.
    #[must_use]
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Return the first `maps` directory (any casing) directly inside one of the candidate roots.
    ///
    /// Filesystem errors are not reported, a root that cannot be read is simply skipped.
    #[must_use]
    pub fn locate(&self) -> Option<PathBuf> {
        self.candidates.iter().find_map(|root| find_dataset_dir(root))
    }
}

fn find_dataset_dir(root: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            trace!("Skipping media root {}: {e}", root.display());
            return None;
        }
    };
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Unable to read an entry of {}: {e}", root.display());
                continue;
            }
        };
        let is_match = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.eq_ignore_ascii_case(DATASET_DIR_NAME));
        // `Path::is_dir` follows symlinks
        let path = entry.path();
        if is_match && path.is_dir() {
            return Some(path);
        }
    }
    None
}
