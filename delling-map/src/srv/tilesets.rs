use actix_web::web::Data;
use actix_web::{HttpResponse, Responder, route};

use crate::datasets::DatasetRegistry;

/// Describe every dataset currently on the media. `[]` when there is none.
#[route("/api/tilesets", method = "GET", method = "HEAD")]
async fn get_tilesets(datasets: Data<DatasetRegistry>) -> impl Responder {
    HttpResponse::Ok().json(datasets.describe_all().await)
}
