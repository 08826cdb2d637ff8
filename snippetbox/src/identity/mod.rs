//! Per-request authentication state

use crate::session::Session;
use crate::userdb::{UserDirectory, UserError};

/// Session key holding the id of the logged-in user
pub const AUTHENTICATED_USER_ID_KEY: &str = "authenticatedUserID";

/// Who is making the current request.
///
/// Built once per request from the session and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated { user_id: i64 },
}

impl Identity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated { .. })
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Identity::Authenticated { user_id } => Some(*user_id),
            Identity::Anonymous => None,
        }
    }
}

/// Resolves the identity recorded in `session`.
///
/// A user id that no longer exists in the directory degrades to
/// [`Identity::Anonymous`]; only a directory failure is an error.
pub async fn resolve_identity(
    session: &Session,
    users: &dyn UserDirectory,
) -> Result<Identity, UserError> {
    let user_id = session.get_int(AUTHENTICATED_USER_ID_KEY).await;
    if user_id == 0 {
        return Ok(Identity::Anonymous);
    }

    if users.exists(user_id).await? {
        Ok(Identity::Authenticated { user_id })
    } else {
        tracing::debug!(user_id, "Session refers to a user that no longer exists");
        Ok(Identity::Anonymous)
    }
}
