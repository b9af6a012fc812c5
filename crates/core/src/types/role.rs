//! User role stored on identity records.

use serde::{Deserialize, Serialize};

/// Role claim of a community user.
///
/// Only [`UserRole::Admin`] may use the admin console. The mobile app
/// writes `viewer` for ordinary members and `trainer` for verified coaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Ordinary community member.
    #[default]
    Viewer,
    /// Verified trainer.
    Trainer,
    /// Console administrator.
    Admin,
}

impl UserRole {
    /// Interpret a role claim read from a stored document.
    ///
    /// Missing, empty or unrecognised values read as [`UserRole::Viewer`] so a
    /// malformed record can never grant access.
    #[must_use]
    pub fn from_claim(claim: Option<&str>) -> Self {
        claim.and_then(|s| s.parse().ok()).unwrap_or_default()
    }

    /// Returns the role as its stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Trainer => "trainer",
            Self::Admin => "admin",
        }
    }

    /// Whether this role grants access to the admin console.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(Self::Viewer),
            "trainer" => Ok(Self::Trainer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_claim_is_lenient() {
        assert_eq!(UserRole::from_claim(Some("admin")), UserRole::Admin);
        assert_eq!(UserRole::from_claim(Some("trainer")), UserRole::Trainer);
        assert_eq!(UserRole::from_claim(Some("user")), UserRole::Viewer);
        assert_eq!(UserRole::from_claim(Some("ADMIN")), UserRole::Viewer);
        assert_eq!(UserRole::from_claim(None), UserRole::Viewer);
    }

    #[test]
    fn test_from_str_is_strict() {
        assert!("superuser".parse::<UserRole>().is_err());
        assert_eq!("viewer".parse::<UserRole>().unwrap(), UserRole::Viewer);
    }

    #[test]
    fn test_only_admin_is_admin() {
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Trainer.is_admin());
        assert!(!UserRole::Viewer.is_admin());
    }
}
