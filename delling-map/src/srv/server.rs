use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use actix_web::http::header::{CACHE_CONTROL, ContentType};
use actix_web::middleware::{Logger, NormalizePath, TrailingSlash};
use actix_web::web::Data;
use actix_web::{App, HttpResponse, HttpServer, Responder, route, web};
use futures::TryFutureExt;
use tracing::warn;

use crate::config::ServerState;
use crate::srv::ships::get_ships;
use crate::srv::tiles::get_tile;
use crate::srv::tilesets::get_tilesets;
use crate::srv::{KEEP_ALIVE_DEFAULT, LISTEN_ADDRESSES_DEFAULT, SrvConfig};
use crate::{DellingError, DellingResult};

const INDEX_BANNER: &str = "Delling map server is running.\n\n\
    No map viewer page is configured (see --web-root).\n\n\
    Available datasets are listed at http://<host>/api/tilesets\n\
    Tiles are served at http://<host>/tiles/<dataset>/<z>/<x>/<y>\n\
    Live ship positions are served at http://<host>/api/ships\n";

/// Serve the viewer page, or a short banner if there is none.
#[route("/", method = "GET", method = "HEAD")]
async fn get_index(srv_config: Data<SrvConfig>) -> HttpResponse {
    if let Some(web_root) = &srv_config.web_root {
        let path = web_root.join("index.html");
        match tokio::fs::read(&path).await {
            Ok(html) => {
                return HttpResponse::Ok()
                    .content_type(ContentType::html())
                    .body(html);
            }
            Err(e) => warn!("Unable to read viewer page {}: {e}", path.display()),
        }
    }
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(INDEX_BANNER)
}

/// Return 200 OK if healthy. Used for readiness and liveness checks.
#[route("/health", method = "GET", method = "HEAD")]
#[allow(clippy::unused_async)]
async fn get_health() -> impl Responder {
    HttpResponse::Ok()
        .insert_header((CACHE_CONTROL, "no-cache"))
        .message_body("OK")
}

pub fn router(cfg: &mut web::ServiceConfig) {
    cfg.service(get_index)
        .service(get_health)
        .service(get_tilesets)
        .service(get_tile)
        .service(get_ships);
}

type Server = Pin<Box<dyn Future<Output = DellingResult<()>>>>;

/// Create a future for an Actix web server together with the listening address.
pub fn new_server(config: SrvConfig, state: ServerState) -> DellingResult<(Server, String)> {
    let keep_alive = Duration::from_secs(config.keep_alive.unwrap_or(KEEP_ALIVE_DEFAULT));
    let worker_processes = config.worker_processes.unwrap_or_else(num_cpus::get);
    let listen_addresses = config
        .listen_addresses
        .clone()
        .unwrap_or_else(|| LISTEN_ADDRESSES_DEFAULT.to_string());

    let factory = move || {
        App::new()
            .app_data(Data::new(state.datasets.clone()))
            .app_data(Data::new(state.ships.clone()))
            .app_data(Data::new(config.clone()))
            .wrap(Logger::default())
            .wrap(NormalizePath::new(TrailingSlash::MergeOnly))
            .configure(router)
    };

    let server = HttpServer::new(factory)
        .bind(listen_addresses.clone())
        .map_err(|e| DellingError::BindingError(e, listen_addresses.clone()))?
        .keep_alive(keep_alive)
        .shutdown_timeout(0)
        .workers(worker_processes)
        .run()
        .err_into();

    Ok((Box::pin(server), listen_addresses))
}
