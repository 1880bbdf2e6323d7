use actix_web::http::StatusCode;
use actix_web::http::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_ENCODING, ContentType,
};
use actix_web::web::{Data, Path};
use actix_web::{HttpResponse, route};
use delling_tile_utils::{TileData, TileInfo};
use serde::Deserialize;
use tracing::{trace, warn};

use crate::datasets::DatasetRegistry;

pub const TILE_CACHE_CONTROL: &str = "public, max-age=86400";

/// Coordinates are taken wider than a tile address can be, so that a well-formed request
/// outside the tile pyramid gets the same `204` as a missing tile.
#[derive(Deserialize, Clone)]
pub struct TileRequest {
    dataset: String,
    z: u64,
    x: u64,
    y: u64,
}

#[route("/tiles/{dataset}/{z}/{x}/{y}", method = "GET", method = "HEAD")]
async fn get_tile(path: Path<TileRequest>, datasets: Data<DatasetRegistry>) -> HttpResponse {
    let TileRequest { dataset, z, x, y } = path.into_inner();
    let Some(file) = datasets.resolve(&dataset).await else {
        return HttpResponse::NotFound()
            .content_type(ContentType::plaintext())
            .body("Tileset not found");
    };

    let (Ok(zoom), Ok(col), Ok(row)) = (u8::try_from(z), u32::try_from(x), u32::try_from(y)) else {
        trace!("Tile {z}/{x}/{y} is outside of the tile pyramid of {dataset}");
        return HttpResponse::NoContent().finish();
    };

    let tile = match file.read_tile(zoom, col, row).await {
        Ok(Some(tile)) => tile,
        Ok(None) => {
            trace!("No tile {z}/{x}/{y} in {dataset}");
            return HttpResponse::NoContent().finish();
        }
        Err(e) => {
            warn!("Unable to read tile {z}/{x}/{y} from {}: {e}", file.path.display());
            return HttpResponse::NoContent().finish();
        }
    };

    let info = file.tile_info().await;
    match info {
        Some(info) => trace!("Serving {} tile {z}/{x}/{y} of {dataset}", info.format),
        None => trace!("Dataset {dataset} declares an unrecognized format"),
    }
    tile_response(tile, info)
}

/// Wrap stored tile bytes with the transport headers for their format.
///
/// The payload is sent as stored. Vector tiles are stored gzip-compressed and are labelled
/// as such instead of being decoded.
#[must_use]
pub fn tile_response(tile: TileData, info: Option<TileInfo>) -> HttpResponse {
    let mut response = HttpResponse::build(StatusCode::OK);
    response
        .insert_header((CACHE_CONTROL, TILE_CACHE_CONTROL))
        .insert_header((ACCESS_CONTROL_ALLOW_ORIGIN, "*"));
    match info {
        Some(info) => {
            response.content_type(info.format.content_type());
            if let Some(enc) = info.encoding.content_encoding() {
                response.insert_header((CONTENT_ENCODING, enc));
            }
        }
        None => {
            response.content_type(ContentType::octet_stream());
        }
    }
    response.body(tile)
}
