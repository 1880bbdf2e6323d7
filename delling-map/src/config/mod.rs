pub mod args;
pub mod env;

mod file;
pub use file::{
    Config, ConfigFileError, ConfigFileResult, ServerState, UPSTREAM_TIMEOUT_DEFAULT,
    UPSTREAM_TIMEOUT_MAX, UPSTREAM_URL_DEFAULT, UnrecognizedKeys, UnrecognizedValues,
    parse_config, read_config,
};
