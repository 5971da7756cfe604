//! [`Gateway`] over HTTP/JSON with `reqwest`.
//!
//! Non-success statuses are turned into failures with `error_for_status`, so a
//! 404 and a refused connection look the same to the caller.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use store::UserId;

use crate::error::{GatewayFailure, Operation};
use crate::gateway::{Collection, Gateway, OWNER_PARAM};
use crate::settings::GatewaySettings;

/// REST gateway rooted at a base URL such as `https://jsonplaceholder.typicode.com`.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Build a gateway from settings. Without `timeout_secs` requests never time out.
    pub fn from_settings(settings: &GatewaySettings) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self::with_client(builder.build()?, &settings.base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/{collection}`
    pub fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.base_url, collection.path())
    }

    /// `{base}/{collection}/{id}`
    pub fn record_url(&self, collection: Collection, id: u64) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }

    async fn send_json<T: DeserializeOwned>(
        request: RequestBuilder,
        operation: Operation,
        collection: Collection,
        id: Option<u64>,
    ) -> Result<T, GatewayFailure> {
        let fail = |e: reqwest::Error| GatewayFailure::new(operation, collection, id, e);
        tracing::debug!("Sending {} {} request", operation, collection);
        request
            .send()
            .await
            .map_err(fail)?
            .error_for_status()
            .map_err(fail)?
            .json::<T>()
            .await
            .map_err(fail)
    }
}

impl Gateway for HttpGateway {
    async fn fetch_all<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, GatewayFailure> {
        let request = self.client.get(self.collection_url(collection));
        Self::send_json(request, Operation::FetchAll, collection, None).await
    }

    async fn fetch_by_owner<T: DeserializeOwned>(
        &self,
        collection: Collection,
        owner: UserId,
    ) -> Result<Vec<T>, GatewayFailure> {
        let request = self
            .client
            .get(self.collection_url(collection))
            .query(&[(OWNER_PARAM, owner)]);
        Self::send_json(request, Operation::FetchByOwner, collection, None).await
    }

    async fn update<T: Serialize + DeserializeOwned>(
        &self,
        collection: Collection,
        id: u64,
        record: &T,
    ) -> Result<T, GatewayFailure> {
        let request = self.client.put(self.record_url(collection, id)).json(record);
        Self::send_json(request, Operation::Update, collection, Some(id)).await
    }

    async fn delete(&self, collection: Collection, id: u64) -> Result<(), GatewayFailure> {
        let fail = |e: reqwest::Error| GatewayFailure::new(Operation::Delete, collection, Some(id), e);
        tracing::debug!("Sending delete {}/{} request", collection, id);
        self.client
            .delete(self.record_url(collection, id))
            .send()
            .await
            .map_err(fail)?
            .error_for_status()
            .map_err(fail)?;
        Ok(())
    }
}
