use crate::catalog::stac;
use crate::types::{ExplorerError, ExplorerResult, SceneQuery, SceneResult};
use std::time::Duration;

/// Synchronous STAC item-search client.
///
/// One HTTP round trip per search; no retry, no caching. Transport
/// failures surface as `CatalogUnavailable`, service-side rejections
/// as `QueryRejected`.
pub struct StacClient {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl StacClient {
    /// Create a client for a STAC API root URL (e.g.
    /// "https://earth-search.aws.element84.com/v1")
    pub fn new(endpoint: &str) -> ExplorerResult<Self> {
        if endpoint.trim().is_empty() {
            return Err(ExplorerError::QueryRejected(
                "Catalog endpoint must not be empty".to_string(),
            ));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("scenescout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ExplorerError::CatalogUnavailable(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Query the catalog for scenes matching `query`.
    ///
    /// Results keep the service's native ordering; scenes whose bbox does
    /// not intersect the AOI bounding box are dropped client-side.
    pub fn search(&self, query: &SceneQuery) -> ExplorerResult<Vec<SceneResult>> {
        let url = format!("{}/search", self.endpoint);
        let body = stac::build_search_body(query);

        log::info!(
            "Searching collection '{}' at {}",
            query.collection,
            url
        );
        log::debug!("AOI bbox: {:?}", query.aoi.bounding_box());

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| ExplorerError::CatalogUnavailable(format!("{}: {}", url, e)))?;

        let status = response.status();
        let text = response.text().map_err(|e| {
            ExplorerError::CatalogUnavailable(format!("Failed to read response body: {}", e))
        })?;

        if status.is_client_error() {
            return Err(ExplorerError::QueryRejected(format!(
                "Catalog returned {}: {}",
                status,
                truncate(&text, 256)
            )));
        }
        if !status.is_success() {
            return Err(ExplorerError::CatalogUnavailable(format!(
                "Catalog returned {}",
                status
            )));
        }

        let scenes = stac::parse_feature_collection(&text)?;
        log::debug!("Catalog returned {} features", scenes.len());

        let matched = stac::filter_intersecting(scenes, &query.aoi.bounding_box());
        log::info!("{} scenes intersect the AOI", matched.len());
        Ok(matched)
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
