//! Scene metadata lookup against the BOS sarcat feature service

use crate::constants::{BOS_SARCAT_QUERY, BOS_SARCAT_URL, BOS_SOURCE};
use crate::types::{SarError, SarResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Catalog client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Feature service endpoint, without query string
    pub url: String,
    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: BOS_SARCAT_URL.to_string(),
            accept_invalid_certs: true,    // the sarcat portal is queried without verification
            timeout_secs: 60,
        }
    }
}

/// Blocking client for the sarcat WFS endpoint
pub struct CatalogClient {
    config: CatalogConfig,
    client: reqwest::blocking::Client,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> SarResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self { config, client })
    }

    /// Look up a scene by catalog identifier (e.g. `ALOS2227337160-180808`) and
    /// return its first feature with `properties` flattened into the top level.
    pub fn lookup(&self, identifier: &str) -> SarResult<Map<String, Value>> {
        let cql_filter = format!("(identifier='{}')", identifier);
        log::info!("Querying {} for {}", self.config.url, cql_filter);

        let response = self
            .client
            .get(&self.config.url)
            .query(&BOS_SARCAT_QUERY)
            .query(&[("cql_filter", cql_filter.as_str())])
            .send()?;

        if !response.status().is_success() {
            return Err(SarError::Metadata(format!(
                "Catalog request failed with status: {}",
                response.status()
            )));
        }

        let body: Value = response.json()?;
        flatten_first_feature(body)
    }
}

/// Take `features[0]` of a GeoJSON feature collection, tag it with its source and
/// move the members of `properties` one level up. Nothing else is validated.
pub fn flatten_first_feature(collection: Value) -> SarResult<Map<String, Value>> {
    let mut feature = match collection {
        Value::Object(mut obj) => match obj.remove("features") {
            Some(Value::Array(features)) => features.into_iter().next(),
            _ => None,
        },
        _ => None,
    }
    .and_then(|f| match f {
        Value::Object(map) => Some(map),
        _ => None,
    })
    .ok_or_else(|| SarError::Metadata("Catalog returned no features".to_string()))?;

    feature.insert("source".to_string(), Value::String(BOS_SOURCE.to_string()));

    match feature.remove("properties") {
        Some(Value::Object(properties)) => {
            for (key, value) in properties {
                feature.insert(key, value);
            }
        }
        _ => {
            return Err(SarError::Metadata(
                "Catalog feature has no properties".to_string(),
            ))
        }
    }

    Ok(feature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_first_feature() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "id": "sarcat.1",
                    "geometry": {"type": "Polygon", "coordinates": [[[1.0, 2.0]]]},
                    "properties": {"identifier": "ALOS2227337160-180808", "source": "catalog"}
                },
                {"type": "Feature", "id": "sarcat.2", "properties": {}}
            ]
        });

        let md = flatten_first_feature(body).unwrap();
        assert_eq!(md["id"], "sarcat.1");
        assert_eq!(md["identifier"], "ALOS2227337160-180808");
        assert!(md.get("properties").is_none());
        assert_eq!(md["geometry"]["type"], "Polygon");
        // properties win over the tag, as the tag is set before flattening
        assert_eq!(md["source"], "catalog");
    }

    #[test]
    fn test_flatten_sets_source() {
        let md = flatten_first_feature(json!({"features": [{"properties": {"a": 1}}]})).unwrap();
        assert_eq!(md["source"], BOS_SOURCE);
        assert_eq!(md["a"], 1);
    }

    #[test]
    fn test_flatten_rejects_empty_or_partial() {
        assert!(flatten_first_feature(json!({"features": []})).is_err());
        assert!(flatten_first_feature(json!({"totalFeatures": 0})).is_err());
        assert!(flatten_first_feature(json!([1, 2])).is_err());
        assert!(flatten_first_feature(json!({"features": [{"id": "x"}]})).is_err());
    }

    #[test]
    fn test_default_config() {
        let config = CatalogConfig::default();
        assert_eq!(config.url, BOS_SARCAT_URL);
        assert!(config.accept_invalid_certs);
    }
}
