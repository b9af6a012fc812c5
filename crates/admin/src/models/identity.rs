//! Identity record domain type.

use serde::{Deserialize, Serialize};

use kinniku_core::{Email, UserId, UserRole};

/// One authenticated principal as recorded in the `users` collection.
///
/// The record id is the identity provider's uid and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Stable document id (provider uid).
    pub id: UserId,
    /// Account email address.
    pub email: Email,
    /// Display name shown in the console header.
    pub display_name: String,
    /// Role claim; only admins may hold a console session.
    pub role: UserRole,
}

impl IdentityRecord {
    /// Whether this record may hold a console session.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
