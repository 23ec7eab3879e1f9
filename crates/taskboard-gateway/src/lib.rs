pub mod http;
pub mod registry;
pub mod session;
pub mod traits;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use http::{HttpClient, HttpGateway};
pub use registry::GatewaySet;
pub use session::SessionContext;
pub use traits::{
    AssignmentGateway, Gateway, ReleaseGateway, SprintGateway, StatusGateway,
};

#[cfg(any(test, feature = "test-util"))]
pub use memory::{Call, Operation, RemoteStore};
