use serde::{Deserialize, Serialize};

/// Role carried by an authenticated caller.
///
/// Administrative callers mutate the catalog and do not count as visits on
/// the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Role::Admin),
            "customer" => Ok(Role::Customer),
            _ => Err(()),
        }
    }
}

/// Caller identity resolved by the auth collaborator upstream of this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User { id: i64, role: Role },
}

impl Caller {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Caller::Anonymous => None,
            Caller::User { id, .. } => Some(*id),
        }
    }

    /// Whether a read by this caller should count as a product visit.
    pub fn counts_as_visit(&self) -> bool {
        match self {
            Caller::Anonymous => true,
            Caller::User { role, .. } => !role.is_admin(),
        }
    }
}
