mod locator;
mod registry;

pub use locator::{
    DATASET_DIR_NAME, DatasetLocator, MEDIA_ROOT_DEFAULT, MediaConfig, USER_MEDIA_DIR_DEFAULT,
};
pub use registry::{DATASET_EXTENSION, Dataset, DatasetFile, DatasetRegistry};
