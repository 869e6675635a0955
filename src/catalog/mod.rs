//! STAC catalog access

pub mod client;
pub mod stac;

pub use client::StacClient;
pub use stac::{build_search_body, filter_intersecting, parse_feature_collection};
