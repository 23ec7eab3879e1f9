use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use taskboard_core::BoardResult;

use crate::entity::{require, EntityId, EntityKind, RemoteEntity, Tracked, Validate};
use crate::project::ProjectId;

pub type ReleaseId = EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseStatus {
    #[default]
    Planned,
    InProgress,
    Released,
    Archived,
}

impl ReleaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReleaseStatus::Planned => "PLANNED",
            ReleaseStatus::InProgress => "IN_PROGRESS",
            ReleaseStatus::Released => "RELEASED",
            ReleaseStatus::Archived => "ARCHIVED",
        }
    }
}

/// A shippable grouping of backlog items (the store calls it a "version").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub id: ReleaseId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub version_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ReleaseStatus,
    /// Absent from some store payloads; the board model fills it in.
    #[serde(default)]
    pub project_id: ProjectId,
}

impl Release {
    pub fn from_draft(id: ReleaseId, draft: &ReleaseDraft) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            version_number: draft.version_number.clone(),
            release_date: None,
            status: ReleaseStatus::Planned,
            project_id: draft.project_id,
        }
    }

    pub fn apply_draft(&mut self, draft: &ReleaseDraft) {
        self.title = draft.title.clone();
        self.description = draft.description.clone();
        self.version_number = draft.version_number.clone();
    }

    pub fn is_shipped(&self) -> bool {
        matches!(
            self.status,
            ReleaseStatus::Released | ReleaseStatus::Archived
        )
    }
}

impl RemoteEntity for Release {
    type Draft = ReleaseDraft;
    const KIND: EntityKind = EntityKind::Release;

    fn id(&self) -> EntityId {
        self.id
    }
}

impl Tracked for Release {
    type Status = ReleaseStatus;

    fn status(&self) -> ReleaseStatus {
        self.status
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDraft {
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub version_number: String,
}

impl Validate for ReleaseDraft {
    fn validate(&self) -> BoardResult<()> {
        require(&self.title, "Title")?;
        require(&self.version_number, "Version number")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_requires_title_and_version_number() {
        let mut draft = ReleaseDraft {
            project_id: 1,
            title: "First cut".into(),
            ..Default::default()
        };
        assert!(draft.validate().is_err());
        draft.version_number = "1.0.0".into();
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_deserialize_store_payload() {
        let json = r#"{"id":5,"title":"Beta","description":"","versionNumber":"0.9","releaseDate":"2024-06-01","status":"RELEASED"}"#;
        let release: Release = serde_json::from_str(json).unwrap();
        assert!(release.is_shipped());
        assert_eq!(release.project_id, 0);
        assert_eq!(release.release_date, NaiveDate::from_ymd_opt(2024, 6, 1));
    }
}
