use reqwest::Method;
use serde_json::json;
use taskboard_core::{GatewayError, GatewayResult};
use taskboard_domain::{
    BacklogItem, Column, EntityId, ItemId, Project, Release, ReleaseStatus, RemoteEntity, Sprint,
    SprintStatus, SubTask, Tracked,
};

/// Where an entity collection lives on the store.
pub trait Route: RemoteEntity {
    const COLLECTION: &'static str;

    /// Path segment naming the parent in list URLs.
    const PARENT_SEGMENT: &'static str = "project";

    fn list_path(parent_id: EntityId) -> String {
        format!("{}/{}/{}", Self::COLLECTION, Self::PARENT_SEGMENT, parent_id)
    }

    fn entity_path(id: EntityId) -> String {
        format!("{}/{}", Self::COLLECTION, id)
    }

    fn update_path(id: EntityId) -> String {
        Self::entity_path(id)
    }
}

impl Route for Project {
    const COLLECTION: &'static str = "/api/projects";

    /// Projects are listed per signed-in user, not per parent.
    fn list_path(_parent_id: EntityId) -> String {
        format!("{}/myprojects", Self::COLLECTION)
    }

    fn update_path(id: EntityId) -> String {
        format!("{}/projects/{}", Self::COLLECTION, id)
    }
}

impl Route for Column {
    const COLLECTION: &'static str = "/api/kanban-columns";
}

impl Route for BacklogItem {
    const COLLECTION: &'static str = "/api/user-stories";
}

impl Route for SubTask {
    const COLLECTION: &'static str = "/api/tasks";
    const PARENT_SEGMENT: &'static str = "user-story";
}

impl Route for Sprint {
    const COLLECTION: &'static str = "/api/sprints";
}

impl Route for Release {
    const COLLECTION: &'static str = "/api/versions";
}

/// A status change as the store expects it.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

pub trait StatusRoute: Tracked + Route {
    fn status_request(id: EntityId, status: &Self::Status) -> GatewayResult<StatusRequest>;
}

impl StatusRoute for BacklogItem {
    fn status_request(id: EntityId, status: &String) -> GatewayResult<StatusRequest> {
        Ok(StatusRequest {
            method: Method::PUT,
            path: format!("{}/status", Self::entity_path(id)),
            body: Some(json!({ "status": status })),
        })
    }
}

impl StatusRoute for Release {
    fn status_request(id: EntityId, status: &ReleaseStatus) -> GatewayResult<StatusRequest> {
        Ok(StatusRequest {
            method: Method::PUT,
            path: format!("{}/status?status={}", Self::entity_path(id), status.as_str()),
            body: None,
        })
    }
}

/// Sprints move forward only, through lifecycle endpoints.
impl StatusRoute for Sprint {
    fn status_request(id: EntityId, status: &SprintStatus) -> GatewayResult<StatusRequest> {
        let action = match status {
            SprintStatus::Active => "start",
            SprintStatus::Completed => "complete",
            SprintStatus::Planned => {
                return Err(GatewayError::validation(
                    "A sprint cannot be moved back to planning",
                ))
            }
        };
        Ok(StatusRequest {
            method: Method::POST,
            path: format!("{}/{}", Self::entity_path(id), action),
            body: None,
        })
    }
}

/// Groupings that backlog items are assigned to.
pub trait AssignmentRoute: Route {
    fn assignment_path(parent_id: EntityId, item_id: ItemId) -> String {
        format!("{}/user-stories/{}", Self::entity_path(parent_id), item_id)
    }

    fn items_path(parent_id: EntityId) -> String {
        format!("{}/user-stories", Self::entity_path(parent_id))
    }
}

impl AssignmentRoute for Sprint {}

impl AssignmentRoute for Release {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_paths() {
        assert_eq!(Column::list_path(3), "/api/kanban-columns/project/3");
        assert_eq!(BacklogItem::entity_path(12), "/api/user-stories/12");
        assert_eq!(SubTask::list_path(12), "/api/tasks/user-story/12");
        assert_eq!(Release::list_path(1), "/api/versions/project/1");
    }

    #[test]
    fn test_project_paths_are_irregular() {
        assert_eq!(Project::list_path(99), "/api/projects/myprojects");
        assert_eq!(Project::update_path(4), "/api/projects/projects/4");
        assert_eq!(Project::entity_path(4), "/api/projects/4");
    }

    #[test]
    fn test_item_status_goes_in_the_body() {
        let request = BacklogItem::status_request(7, &"DONE".to_string()).unwrap();
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.path, "/api/user-stories/7/status");
        assert_eq!(request.body, Some(json!({ "status": "DONE" })));
    }

    #[test]
    fn test_release_status_goes_in_the_query() {
        let request = Release::status_request(2, &ReleaseStatus::InProgress).unwrap();
        assert_eq!(request.path, "/api/versions/2/status?status=IN_PROGRESS");
        assert!(request.body.is_none());
    }

    #[test]
    fn test_sprint_lifecycle_endpoints() {
        let start = Sprint::status_request(5, &SprintStatus::Active).unwrap();
        assert_eq!(start.method, Method::POST);
        assert_eq!(start.path, "/api/sprints/5/start");

        let complete = Sprint::status_request(5, &SprintStatus::Completed).unwrap();
        assert_eq!(complete.path, "/api/sprints/5/complete");

        let err = Sprint::status_request(5, &SprintStatus::Planned).unwrap_err();
        assert!(matches!(err, GatewayError::BadRequest(Some(_))));
    }

    #[test]
    fn test_assignment_paths() {
        assert_eq!(
            Sprint::assignment_path(5, 12),
            "/api/sprints/5/user-stories/12"
        );
        assert_eq!(Release::items_path(2), "/api/versions/2/user-stories");
    }
}
