use std::rc::Rc;
use taskboard_core::{AppConfig, BoardResult};
use taskboard_domain::{BacklogItem, Column, Project, Release, Sprint, SubTask};

use crate::http::{HttpClient, HttpGateway};
use crate::session::SessionContext;
use crate::traits::{Gateway, ReleaseGateway, SprintGateway, StatusGateway};

/// One gateway per entity type, shared by everything that talks to the
/// store on behalf of a board.
#[derive(Clone)]
pub struct GatewaySet {
    pub projects: Rc<dyn Gateway<Project>>,
    pub columns: Rc<dyn Gateway<Column>>,
    pub items: Rc<dyn StatusGateway<BacklogItem>>,
    pub sub_tasks: Rc<dyn Gateway<SubTask>>,
    pub sprints: Rc<dyn SprintGateway>,
    pub releases: Rc<dyn ReleaseGateway>,
}

impl GatewaySet {
    /// REST gateways against the configured store, authenticated as
    /// `session`.
    pub fn http(config: &AppConfig, session: SessionContext) -> BoardResult<Self> {
        let client = HttpClient::new(config, session)?;
        tracing::info!(
            "Using remote store at {} as {}",
            config.base_url(),
            client.session().username()
        );

        Ok(Self {
            projects: Rc::new(HttpGateway::<Project>::new(client.clone())),
            columns: Rc::new(HttpGateway::<Column>::new(client.clone())),
            items: Rc::new(HttpGateway::<BacklogItem>::new(client.clone())),
            sub_tasks: Rc::new(HttpGateway::<SubTask>::new(client.clone())),
            sprints: Rc::new(HttpGateway::<Sprint>::new(client.clone())),
            releases: Rc::new(HttpGateway::<Release>::new(client)),
        })
    }

    /// Every gateway backed by the same in-memory store.
    #[cfg(any(test, feature = "test-util"))]
    pub fn in_memory(store: Rc<crate::memory::RemoteStore>) -> Self {
        Self {
            projects: store.clone(),
            columns: store.clone(),
            items: store.clone(),
            sub_tasks: store.clone(),
            sprints: store.clone(),
            releases: store,
        }
    }
}
