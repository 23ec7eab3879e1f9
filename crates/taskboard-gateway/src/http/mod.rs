//! Gateways backed by the remote store's REST API.

pub mod client;
pub mod gateway;
pub mod routes;

pub use client::{authorize, HttpClient};
pub use gateway::HttpGateway;
pub use routes::{AssignmentRoute, Route, StatusRequest, StatusRoute};
