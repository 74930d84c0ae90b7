//! Video catalog client
//!
//! `GET /api/videos` answers either with a bare array of records or with
//! `{ "videos": [...] }`; both shapes are accepted.

use crate::{
    config::PlayerConfig,
    net::{HttpFetch, RequestKind},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// One entry of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogBody {
    List(Vec<VideoRecord>),
    Wrapped { videos: Vec<VideoRecord> },
}

/// Parse a catalog response body
pub fn parse_catalog(body: &[u8]) -> Result<Vec<VideoRecord>> {
    match serde_json::from_slice(body) {
        Ok(CatalogBody::List(videos)) | Ok(CatalogBody::Wrapped { videos }) => Ok(videos),
        Err(e) => Err(Error::Catalog(e.to_string())),
    }
}

/// Reads the catalog from the API origin
pub struct CatalogClient<F> {
    fetcher: F,
    config: PlayerConfig,
}

impl<F: HttpFetch> CatalogClient<F> {
    pub fn new(fetcher: F, config: PlayerConfig) -> Self {
        Self { fetcher, config }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<VideoRecord>> {
        let url = self.config.catalog_url()?;
        let response = self
            .fetcher
            .get(&url, RequestKind::Api)
            .await
            .map_err(|e| Error::Catalog(e.to_string()))?;

        if !response.is_success() {
            return Err(Error::Catalog(format!("HTTP {}", response.status)));
        }

        let videos = parse_catalog(&response.body)?;
        debug!(count = videos.len(), "Catalog loaded");
        Ok(videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{FetchError, FetchResponse};
    use async_trait::async_trait;
    use url::Url;

    #[test]
    fn test_both_shapes() {
        let bare = br#"[{"_id":"a1","title":"Intro"}]"#;
        let wrapped = br#"{"videos":[{"_id":"a1","title":"Intro","description":"First"}]}"#;

        let list = parse_catalog(bare).unwrap();
        assert_eq!(list[0].id, "a1");
        assert!(list[0].description.is_none());

        let list = parse_catalog(wrapped).unwrap();
        assert_eq!(list[0].description.as_deref(), Some("First"));
    }

    #[test]
    fn test_garbage_is_catalog_error() {
        let err = parse_catalog(b"<html>").unwrap_err();
        assert_eq!(err.error_code(), "CATALOG");
    }

    struct Api(u16, &'static str);

    #[async_trait]
    impl HttpFetch for Api {
        async fn get(&self, url: &Url, kind: RequestKind) -> std::result::Result<FetchResponse, FetchError> {
            assert_eq!(url.path(), "/api/videos");
            assert_eq!(kind, RequestKind::Api);
            Ok(FetchResponse::new(self.0, self.1))
        }
    }

    #[tokio::test]
    async fn test_list() {
        let client = CatalogClient::new(Api(200, r#"[{"_id":"x","title":"T"}]"#), PlayerConfig::default());
        assert_eq!(client.list().await.unwrap().len(), 1);

        let client = CatalogClient::new(Api(500, ""), PlayerConfig::default());
        assert!(matches!(client.list().await, Err(Error::Catalog(_))));
    }
}
