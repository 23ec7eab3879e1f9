//! Backlog item filtering.
//!
//! Provides the ItemFilter trait and the sprint and release filters that
//! select which items a board grouping shows.

use crate::backlog_item::BacklogItem;
use crate::release::ReleaseId;
use crate::sprint::SprintId;

/// Trait for filtering backlog items by various criteria.
pub trait ItemFilter {
    /// Returns true if the item matches the filter criteria.
    fn matches(&self, item: &BacklogItem) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SprintFilter {
    #[default]
    All,
    /// Items not planned into any sprint.
    Unscheduled,
    Sprint(SprintId),
}

impl ItemFilter for SprintFilter {
    fn matches(&self, item: &BacklogItem) -> bool {
        match self {
            SprintFilter::All => true,
            SprintFilter::Unscheduled => item.sprint_id.is_none(),
            SprintFilter::Sprint(id) => item.sprint_id == Some(*id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleaseFilter {
    #[default]
    All,
    /// Items not assigned to any release.
    Unreleased,
    Release(ReleaseId),
}

impl ItemFilter for ReleaseFilter {
    fn matches(&self, item: &BacklogItem) -> bool {
        match self {
            ReleaseFilter::All => true,
            ReleaseFilter::Unreleased => item.release_id.is_none(),
            ReleaseFilter::Release(id) => item.release_id == Some(*id),
        }
    }
}

/// Filter items by status key.
pub struct StatusFilter<'a> {
    status_key: &'a str,
}

impl<'a> StatusFilter<'a> {
    pub fn new(status_key: &'a str) -> Self {
        Self { status_key }
    }
}

impl ItemFilter for StatusFilter<'_> {
    fn matches(&self, item: &BacklogItem) -> bool {
        item.status == self.status_key
    }
}

/// The active filters of a board view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoardFilter {
    pub sprint: SprintFilter,
    pub release: ReleaseFilter,
}

impl BoardFilter {
    pub fn sprint(sprint: SprintFilter) -> Self {
        Self {
            sprint,
            ..Default::default()
        }
    }

    pub fn release(release: ReleaseFilter) -> Self {
        Self {
            release,
            ..Default::default()
        }
    }
}

impl ItemFilter for BoardFilter {
    fn matches(&self, item: &BacklogItem) -> bool {
        self.sprint.matches(item) && self.release.matches(item)
    }
}
