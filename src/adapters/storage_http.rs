use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use reqwest::StatusCode;
use url::Url;

use crate::{
    core::model::{RawSpan, Trace, TraceId, TraceQuery},
    ports::storage::{Storage, StorageError, StorageResult},
};

/// Storage adapter talking to the span storage service over HTTP.
///
/// `DATABASE_URL` is the base URL; the adapter only knows the collaborator's
/// fixed endpoint layout (`/ping`, `/spans`, `/traces/{id}`, `/services`,
/// `/services/{name}/operations`, `/traces/search`). Everything else about
/// persistence lives on the other side.
pub struct HttpStorage {
    client: reqwest::Client,
    base: Url,
}

impl HttpStorage {
    pub fn new(base: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .wrap_err("Failed to build storage HTTP client")?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> StorageResult<Url> {
        let mut base = self.base.clone();
        {
            let mut segments = base
                .path_segments_mut()
                .map_err(|_| StorageError::Backend("storage URL cannot be a base".to_string()))?;
            segments.pop_if_empty();
            segments.extend(path.split('/'));
        }
        Ok(base)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> StorageResult<T> {
        let response = check_status(response)?;
        response
            .json()
            .await
            .map_err(|e| StorageError::Decode(e.to_string()))
    }
}

fn check_status(response: reqwest::Response) -> StorageResult<reqwest::Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(StorageError::NotFound),
        status => Err(StorageError::Backend(format!(
            "storage returned {status}"
        ))),
    }
}

fn transport_error(e: reqwest::Error) -> StorageError {
    StorageError::Unavailable(e.to_string())
}

#[async_trait]
impl Storage for HttpStorage {
    async fn ping(&self) -> StorageResult<()> {
        let response = self
            .client
            .get(self.endpoint("ping")?)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).map(|_| ())
    }

    async fn store_span(&self, span: RawSpan) -> StorageResult<()> {
        let response = self
            .client
            .post(self.endpoint("spans")?)
            .json(&span)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).map(|_| ())
    }

    async fn trace_by_id(&self, id: TraceId) -> StorageResult<Trace> {
        let response = self
            .client
            .get(self.endpoint(&format!("traces/{id}"))?)
            .send()
            .await
            .map_err(transport_error)?;
        Self::decode(response).await
    }

    async fn services(&self) -> StorageResult<Vec<String>> {
        let response = self
            .client
            .get(self.endpoint("services")?)
            .send()
            .await
            .map_err(transport_error)?;
        Self::decode(response).await
    }

    async fn operations(&self, service: &str) -> StorageResult<Vec<String>> {
        let response = self
            .client
            .get(self.endpoint(&format!("services/{service}/operations"))?)
            .send()
            .await
            .map_err(transport_error)?;
        Self::decode(response).await
    }

    async fn query(&self, query: TraceQuery) -> StorageResult<Vec<Trace>> {
        let response = self
            .client
            .post(self.endpoint("traces/search")?)
            .json(&query)
            .send()
            .await
            .map_err(transport_error)?;
        Self::decode(response).await
    }
}
