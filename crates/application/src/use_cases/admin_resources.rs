//! CRUD access to the `/admin` collections.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tenancy_domain::{AdminResource, ApiRequest, Page, PageQuery};

use crate::client::ApiClient;
use crate::error::ApiResult;

/// Typed access to one admin collection.
///
/// `T` is the item schema; every response is decoded into it strictly.
pub struct AdminResources<T> {
    client: Arc<ApiClient>,
    resource: AdminResource,
    _item: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> AdminResources<T> {
    /// Creates an accessor for `resource`.
    #[must_use]
    pub const fn new(client: Arc<ApiClient>, resource: AdminResource) -> Self {
        Self {
            client,
            resource,
            _item: PhantomData,
        }
    }

    /// Returns the collection this accessor targets.
    #[must_use]
    pub const fn resource(&self) -> AdminResource {
        self.resource
    }

    /// Fetches one page of items.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn list(&self, query: &PageQuery) -> ApiResult<Page<T>> {
        let request = query
            .to_pairs()
            .into_iter()
            .fold(ApiRequest::get(self.resource.path()), |request, (key, value)| {
                request.with_query(key, value)
            });
        self.client.request_json(request).await
    }

    /// Fetches a single item.
    ///
    /// # Errors
    ///
    /// Returns a client error for unusable ids, or the normalized request error.
    pub async fn get(&self, id: &str) -> ApiResult<T> {
        let path = self.resource.item_path(id)?;
        self.client.get(&path).await
    }

    /// Creates an item and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn create<B: Serialize + Sync + ?Sized>(&self, body: &B) -> ApiResult<T> {
        self.client.post(self.resource.path(), body).await
    }

    /// Replaces an item and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns a client error for unusable ids, or the normalized request error.
    pub async fn update<B: Serialize + Sync + ?Sized>(&self, id: &str, body: &B) -> ApiResult<T> {
        let path = self.resource.item_path(id)?;
        self.client.put(&path, body).await
    }

    /// Deletes an item.
    ///
    /// # Errors
    ///
    /// Returns a client error for unusable ids, or the normalized request error.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let path = self.resource.item_path(id)?;
        self.client.send(ApiRequest::delete(path)).await?;
        tracing::debug!(resource = %self.resource, id, "deleted");
        Ok(())
    }
}

impl<T> std::fmt::Debug for AdminResources<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminResources")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}
