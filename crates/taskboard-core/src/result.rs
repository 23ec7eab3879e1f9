use crate::error::{BoardError, GatewayError};

pub type BoardResult<T> = Result<T, BoardError>;

pub type GatewayResult<T> = Result<T, GatewayError>;
