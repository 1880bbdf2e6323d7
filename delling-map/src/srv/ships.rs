use std::time::Duration;

use actix_web::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, ContentType};
use actix_web::web::{Bytes, Data};
use actix_web::{HttpResponse, route};
use serde::de::IgnoredAny;
use tracing::{debug, trace};
use url::Url;

use crate::{DellingError, DellingResult};

#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("request to {1} failed: {0}")]
    RequestFailed(#[source] reqwest::Error, Url),

    #[error("{1} returned a body that is not JSON: {0}")]
    InvalidJson(#[source] serde_json::Error, Url),
}

/// Forwards `/api/ships` to the live-position service.
///
/// The client is created once and shared by all workers. Idle connections are not kept, so a
/// connection is never reused from a different worker's runtime.
#[derive(Clone, Debug)]
pub struct ShipsProxy {
    client: reqwest::Client,
    url: Url,
}

impl ShipsProxy {
    pub fn new(base_url: &Url, timeout: Duration) -> DellingResult<Self> {
        let joined = format!("{}/api/ships", base_url.as_str().trim_end_matches('/'));
        let url = Url::parse(&joined).map_err(|e| DellingError::InvalidUpstreamUrl(e, joined))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self { client, url })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch the current positions. The body is returned as received once it is known to be JSON.
    pub async fn fetch(&self) -> Result<Bytes, UpstreamError> {
        let map_err = |e: reqwest::Error| UpstreamError::RequestFailed(e, self.url.clone());
        let body = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(map_err)?
            .bytes()
            .await
            .map_err(map_err)?;
        serde_json::from_slice::<IgnoredAny>(&body)
            .map_err(|e| UpstreamError::InvalidJson(e, self.url.clone()))?;
        Ok(body)
    }
}

#[route("/api/ships", method = "GET")]
async fn get_ships(ships: Data<ShipsProxy>) -> HttpResponse {
    let body = match ships.fetch().await {
        Ok(body) => {
            trace!("Forwarding {} bytes of ship positions", body.len());
            body
        }
        Err(e) => {
            debug!("Live-position service unavailable, sending no ships: {e}");
            Bytes::from_static(b"[]")
        }
    };
    HttpResponse::Ok()
        .content_type(ContentType::json())
        .insert_header((CACHE_CONTROL, "no-cache"))
        .insert_header((ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .body(body)
}
