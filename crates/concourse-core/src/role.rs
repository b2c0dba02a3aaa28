//! Caller roles and role groups.
//!
//! Roles arrive from the authorization service as part of the caller's
//! identity. Endpoints do not list roles directly; they name a [`RoleGroup`],
//! whose membership depends on the [`RunMode`] the process was started in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A caller role as reported by the authorization service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Staff member with management rights.
    Manager,
    /// Regular end user.
    User,
    /// Developer access, only honoured outside production.
    Developer,
}

impl Role {
    /// The canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::User => "user",
            Self::Developer => "developer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "user" => Ok(Self::User),
            "developer" => Ok(Self::Developer),
            _ => Err(CoreError::UnknownRole(s.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// The environment the process runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Production.
    Prod,
    /// Staging.
    Stage,
    /// Local development.
    #[default]
    Dev,
    /// Automated tests.
    Test,
}

impl RunMode {
    /// Returns `true` in production.
    #[must_use]
    pub const fn is_prod(self) -> bool {
        matches!(self, Self::Prod)
    }
}

impl FromStr for RunMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prod" => Ok(Self::Prod),
            "stage" => Ok(Self::Stage),
            "dev" => Ok(Self::Dev),
            "test" => Ok(Self::Test),
            _ => Err(CoreError::UnknownMode(s.to_string())),
        }
    }
}

/// Named sets of roles used by endpoint access checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleGroup {
    /// Administrators (plus developers outside production).
    Admin,
    /// Administrators and managers.
    Staff,
    /// Every authenticated role.
    Common,
    /// Developer-only endpoints. Empty in production.
    Private,
}

impl RoleGroup {
    /// The roles belonging to this group under the given run mode.
    #[must_use]
    pub fn roles(self, mode: RunMode) -> Vec<Role> {
        let extra: &[Role] = if mode.is_prod() {
            &[]
        } else {
            &[Role::Developer]
        };

        let mut roles = match self {
            Self::Admin => vec![Role::Admin],
            Self::Staff => vec![Role::Admin, Role::Manager],
            Self::Common => vec![Role::Admin, Role::Manager, Role::User],
            Self::Private => Vec::new(),
        };
        roles.extend_from_slice(extra);
        roles
    }

    /// Returns `true` if `role` is a member of this group under `mode`.
    #[must_use]
    pub fn allows(self, role: Role, mode: RunMode) -> bool {
        self.roles(mode).contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Developer".parse::<Role>().unwrap(), Role::Developer);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn role_serde_accepts_uppercase() {
        let role: Role = serde_json::from_str("\"MANAGER\"").unwrap();
        assert_eq!(role, Role::Manager);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"manager\"");
    }

    #[test]
    fn groups_are_nested() {
        let mode = RunMode::Stage;
        for role in RoleGroup::Admin.roles(mode) {
            assert!(RoleGroup::Staff.allows(role, mode));
        }
        for role in RoleGroup::Staff.roles(mode) {
            assert!(RoleGroup::Common.allows(role, mode));
        }
    }

    #[test]
    fn developer_only_outside_prod() {
        assert!(RoleGroup::Common.allows(Role::Developer, RunMode::Dev));
        assert!(!RoleGroup::Common.allows(Role::Developer, RunMode::Prod));
        assert!(RoleGroup::Private.roles(RunMode::Prod).is_empty());
        assert_eq!(RoleGroup::Private.roles(RunMode::Test), vec![Role::Developer]);
    }

    #[test]
    fn user_is_not_staff() {
        assert!(RoleGroup::Common.allows(Role::User, RunMode::Prod));
        assert!(!RoleGroup::Staff.allows(Role::User, RunMode::Prod));
        assert!(!RoleGroup::Private.allows(Role::Admin, RunMode::Dev));
    }

    #[test]
    fn run_mode_parsing() {
        assert_eq!("PROD".parse::<RunMode>().unwrap(), RunMode::Prod);
        assert!("production".parse::<RunMode>().is_err());
        assert_eq!(RunMode::default(), RunMode::Dev);
    }
}
