use std::fmt;

/// Credentials of the signed-in user.
///
/// Built once by the host and handed to the gateways at construction;
/// nothing in this crate reads credentials from anywhere else.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionContext {
    username: String,
    token: String,
}

impl SessionContext {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}
