use async_trait::async_trait;
use reqwest::Method;
use std::marker::PhantomData;
use taskboard_core::GatewayResult;
use taskboard_domain::{BacklogItem, EntityId, ItemId};

use super::client::HttpClient;
use super::routes::{AssignmentRoute, Route, StatusRoute};
use crate::traits::{AssignmentGateway, Gateway, StatusGateway};

/// REST gateway for one entity collection.
pub struct HttpGateway<T> {
    client: HttpClient,
    _entity: PhantomData<fn() -> T>,
}

impl<T> HttpGateway<T> {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            _entity: PhantomData,
        }
    }
}

#[async_trait(?Send)]
impl<T: Route> Gateway<T> for HttpGateway<T> {
    async fn list(&self, parent_id: EntityId) -> GatewayResult<Vec<T>> {
        let path = T::list_path(parent_id);
        tracing::debug!("Listing {}s from {}", T::KIND, path);
        self.client
            .send_json(self.client.request(Method::GET, &path))
            .await
    }

    async fn get(&self, id: EntityId) -> GatewayResult<T> {
        self.client
            .send_json(self.client.request(Method::GET, &T::entity_path(id)))
            .await
    }

    async fn create(&self, draft: &T::Draft) -> GatewayResult<T> {
        tracing::debug!("Creating {}", T::KIND);
        let request = self.client.request(Method::POST, T::COLLECTION).json(draft);
        self.client.send_json(request).await
    }

    async fn update(&self, id: EntityId, draft: &T::Draft) -> GatewayResult<T> {
        tracing::debug!("Updating {} {}", T::KIND, id);
        let request = self
            .client
            .request(Method::PUT, &T::update_path(id))
            .json(draft);
        self.client.send_json(request).await
    }

    async fn delete(&self, id: EntityId) -> GatewayResult<()> {
        tracing::debug!("Deleting {} {}", T::KIND, id);
        self.client
            .send_empty(self.client.request(Method::DELETE, &T::entity_path(id)))
            .await
    }
}

#[async_trait(?Send)]
impl<T: StatusRoute> StatusGateway<T> for HttpGateway<T> {
    async fn update_status(&self, id: EntityId, status: T::Status) -> GatewayResult<T> {
        let status_request = T::status_request(id, &status)?;
        tracing::debug!("Changing {} {} status to {:?}", T::KIND, id, status);
        let mut request = self
            .client
            .request(status_request.method, &status_request.path);
        if let Some(body) = status_request.body {
            request = request.json(&body);
        }
        self.client.send_json(request).await
    }
}

#[async_trait(?Send)]
impl<T: AssignmentRoute> AssignmentGateway<T> for HttpGateway<T> {
    async fn assign(&self, parent_id: EntityId, item_id: ItemId) -> GatewayResult<BacklogItem> {
        let path = T::assignment_path(parent_id, item_id);
        self.client
            .send_json(self.client.request(Method::POST, &path))
            .await
    }

    async fn unassign(&self, parent_id: EntityId, item_id: ItemId) -> GatewayResult<BacklogItem> {
        let path = T::assignment_path(parent_id, item_id);
        self.client
            .send_json(self.client.request(Method::DELETE, &path))
            .await
    }

    async fn items(&self, parent_id: EntityId) -> GatewayResult<Vec<BacklogItem>> {
        self.client
            .send_json(self.client.request(Method::GET, &T::items_path(parent_id)))
            .await
    }
}
