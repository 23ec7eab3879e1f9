use async_trait::async_trait;
use taskboard_core::GatewayResult;
use taskboard_domain::{BacklogItem, EntityId, ItemId, Release, RemoteEntity, Sprint, Tracked};

/// Request/response wrapper around one remote entity collection.
///
/// Each method maps to exactly one store endpoint. Calls are made from a
/// single thread, so the futures are not required to be `Send`.
#[async_trait(?Send)]
pub trait Gateway<T: RemoteEntity> {
    /// List the entities under a parent (project or backlog item).
    async fn list(&self, parent_id: EntityId) -> GatewayResult<Vec<T>>;

    async fn get(&self, id: EntityId) -> GatewayResult<T>;

    async fn create(&self, draft: &T::Draft) -> GatewayResult<T>;

    async fn update(&self, id: EntityId, draft: &T::Draft) -> GatewayResult<T>;

    async fn delete(&self, id: EntityId) -> GatewayResult<()>;
}

/// Gateways for entities whose status changes through a dedicated endpoint.
#[async_trait(?Send)]
pub trait StatusGateway<T: Tracked>: Gateway<T> {
    async fn update_status(&self, id: EntityId, status: T::Status) -> GatewayResult<T>;
}

/// Association between a grouping entity `P` (sprint or release) and
/// backlog items.
#[async_trait(?Send)]
pub trait AssignmentGateway<P: RemoteEntity> {
    async fn assign(&self, parent_id: EntityId, item_id: ItemId) -> GatewayResult<BacklogItem>;

    async fn unassign(&self, parent_id: EntityId, item_id: ItemId) -> GatewayResult<BacklogItem>;

    async fn items(&self, parent_id: EntityId) -> GatewayResult<Vec<BacklogItem>>;
}

pub trait SprintGateway: StatusGateway<Sprint> + AssignmentGateway<Sprint> {}

impl<G> SprintGateway for G where G: StatusGateway<Sprint> + AssignmentGateway<Sprint> + ?Sized {}

pub trait ReleaseGateway: StatusGateway<Release> + AssignmentGateway<Release> {}

impl<G> ReleaseGateway for G where G: StatusGateway<Release> + AssignmentGateway<Release> + ?Sized {}
