mod config;
pub use config::{KEEP_ALIVE_DEFAULT, LISTEN_ADDRESSES_DEFAULT, SrvConfig};

mod server;
pub use server::{new_server, router};

mod ships;
pub use ships::{ShipsProxy, UpstreamError};

mod tiles;
mod tilesets;
