//! Bearer-token authentication and the role gate.

pub mod middleware;
pub mod token;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, User};

pub use middleware::{require_auth, require_crm_access};
pub use token::{AuthError, Claims, TokenKeys};

/// The authenticated caller, attached to the request by [`require_auth`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Read and change CRM records.
    UseCrm,
}

pub fn has_capability(identity: &Identity, capability: Capability) -> bool {
    match capability {
        Capability::UseCrm => identity.role == Role::Admin,
    }
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
