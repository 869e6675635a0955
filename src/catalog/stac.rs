use crate::types::{AssetRef, BoundingBox, ExplorerError, ExplorerResult, SceneQuery, SceneResult};
use chrono::SecondsFormat;
use serde::Deserialize;
use std::collections::HashMap;

/// Wire structures for the STAC item-search response.
/// Only the fields this crate consumes are modeled.
#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub collection_type: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    pub id: String,
    #[serde(default)]
    pub bbox: Option<Vec<f64>>,
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub assets: HashMap<String, AssetRef>,
}

/// Build the JSON body for a POST /search request
pub fn build_search_body(query: &SceneQuery) -> serde_json::Value {
    let mut body = serde_json::json!({
        "collections": [query.collection],
        "intersects": query.aoi.to_geojson(),
    });
    if let Some((start, stop)) = &query.date_range {
        body["datetime"] = serde_json::Value::String(format!(
            "{}/{}",
            start.to_rfc3339_opts(SecondsFormat::Secs, true),
            stop.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
    }
    body
}

/// Map a STAC FeatureCollection JSON document to scene results,
/// preserving the service's native feature order
pub fn parse_feature_collection(json: &str) -> ExplorerResult<Vec<SceneResult>> {
    let collection: FeatureCollection = serde_json::from_str(json).map_err(|e| {
        ExplorerError::InvalidFormat(format!("Malformed STAC search response: {}", e))
    })?;

    if collection.collection_type != "FeatureCollection" {
        return Err(ExplorerError::InvalidFormat(format!(
            "Expected FeatureCollection, got '{}'",
            collection.collection_type
        )));
    }

    let mut scenes = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let bbox = match &feature.bbox {
            Some(values) => Some(BoundingBox::from_slice(values)?),
            None => None,
        };
        scenes.push(SceneResult {
            id: feature.id,
            bbox,
            properties: feature.properties,
            assets: feature.assets,
        });
    }
    Ok(scenes)
}

/// Retain the scenes whose bbox intersects the AOI bounding box.
///
/// Services are expected to filter server-side already; this keeps the
/// client honest against catalogs that return a superset. Scenes that
/// carry no bbox cannot be judged and are kept.
pub fn filter_intersecting(scenes: Vec<SceneResult>, aoi_bbox: &BoundingBox) -> Vec<SceneResult> {
    scenes
        .into_iter()
        .filter(|scene| match &scene.bbox {
            Some(bbox) => bbox.intersects(aoi_bbox),
            None => {
                log::warn!("Scene '{}' has no bbox, keeping it unfiltered", scene.id);
                true
            }
        })
        .collect()
}
