//! Authorization policy engine
//!
//! A single table decides, for every resource and verb, which roles may call
//! it and whether owner-role callers are restricted to their own records.
//! Evaluation is pure: `(claims, action) -> Decision`.

use std::collections::HashMap;
use std::fmt;

use crypto_core::{Claims, Role};

use crate::error::AppError;

// ============================================================================
// Actions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Pet,
    Owner,
    Appointment,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Pet, Resource::Owner, Resource::Appointment];

    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Pet => "pets",
            Resource::Owner => "owners",
            Resource::Appointment => "appointments",
        }
    }

    pub fn route(self) -> &'static str {
        match self {
            Resource::Pet => "/pets",
            Resource::Owner => "/owners",
            Resource::Appointment => "/appointments",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    List,
    Read,
    Create,
    Update,
    Delete,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::List => "list",
            Verb::Read => "read",
            Verb::Create => "create",
            Verb::Update => "update",
            Verb::Delete => "delete",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a caller is trying to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub resource: Resource,
    pub verb: Verb,
    /// Owner key of the target record, when one exists
    pub target_owner_id: Option<i64>,
}

impl Action {
    pub fn new(resource: Resource, verb: Verb) -> Self {
        Self {
            resource,
            verb,
            target_owner_id: None,
        }
    }

    pub fn on_record(resource: Resource, verb: Verb, owner_id: i64) -> Self {
        Self {
            resource,
            verb,
            target_owner_id: Some(owner_id),
        }
    }
}

// ============================================================================
// Decisions
// ============================================================================

/// Per-verb requirement for owner-role callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Collection reads are narrowed to the caller's own records
    Scoped,
    /// Target record must belong to the caller
    Owned,
    /// Allowed; the handler binds the new record to the caller
    SelfService,
    /// Staff and admin only
    Elevated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("role is not permitted on this route")]
    RoleNotPermitted,

    #[error("operation requires staff or admin")]
    ElevationRequired,

    #[error("record belongs to another owner")]
    NotOwner,
}

impl Denial {
    pub fn as_str(self) -> &'static str {
        match self {
            Denial::RoleNotPermitted => "role_not_permitted",
            Denial::ElevationRequired => "elevation_required",
            Denial::NotOwner => "not_owner",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    AllowScoped { owner_id: i64 },
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        !matches!(self, Decision::Deny(_))
    }

    /// Ok(None) for unrestricted access, Ok(Some(owner_id)) when scoped
    pub fn into_result(self) -> Result<Option<i64>, AppError> {
        match self {
            Decision::Allow => Ok(None),
            Decision::AllowScoped { owner_id } => Ok(Some(owner_id)),
            Decision::Deny(denial) => Err(AppError::Forbidden(denial.to_string())),
        }
    }
}

// ============================================================================
// Policy Table
// ============================================================================

/// Requirement for each (resource, verb) pair
pub fn requirement(resource: Resource, verb: Verb) -> Requirement {
    use Requirement::*;

    match (resource, verb) {
        (_, Verb::List) => Scoped,
        (_, Verb::Read) | (_, Verb::Update) => Owned,
        (Resource::Pet, Verb::Create) => SelfService,
        (Resource::Pet, Verb::Delete) | (Resource::Appointment, Verb::Delete) => Owned,
        (Resource::Owner, Verb::Create)
        | (Resource::Owner, Verb::Delete)
        | (Resource::Appointment, Verb::Create) => Elevated,
    }
}

/// Route-level role allow-lists plus the requirement table
#[derive(Debug, Clone)]
pub struct PolicyTable {
    allowed: HashMap<Resource, Vec<Role>>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        let allowed = Resource::ALL
            .iter()
            .map(|resource| (*resource, Role::ALL.to_vec()))
            .collect();
        Self { allowed }
    }
}

impl PolicyTable {
    /// Replace the allow-list for one resource
    pub fn with_roles(mut self, resource: Resource, roles: &[Role]) -> Self {
        self.allowed.insert(resource, roles.to_vec());
        self
    }

    pub fn permits_role(&self, resource: Resource, role: Role) -> bool {
        self.allowed
            .get(&resource)
            .map(|roles| roles.contains(&role))
            .unwrap_or(false)
    }

    /// Full evaluation: role allow-list, verb requirement, then ownership
    pub fn authorize(&self, claims: &Claims, action: &Action) -> Decision {
        self.evaluate(claims, action, true)
    }

    /// Role allow-list and verb requirement only, for checks made before the
    /// target record has been loaded
    pub fn admits(&self, claims: &Claims, resource: Resource, verb: Verb) -> Decision {
        self.evaluate(claims, &Action::new(resource, verb), false)
    }

    fn evaluate(&self, claims: &Claims, action: &Action, check_ownership: bool) -> Decision {
        if !self.permits_role(action.resource, claims.role) {
            return Decision::Deny(Denial::RoleNotPermitted);
        }

        let elevated = claims.role.is_elevated();

        match requirement(action.resource, action.verb) {
            Requirement::Elevated if !elevated => Decision::Deny(Denial::ElevationRequired),
            Requirement::Elevated | Requirement::SelfService => Decision::Allow,
            Requirement::Scoped if elevated => Decision::Allow,
            Requirement::Scoped => Decision::AllowScoped {
                owner_id: claims.user_id,
            },
            Requirement::Owned if elevated || !check_ownership => Decision::Allow,
            Requirement::Owned => {
                if action.target_owner_id == Some(claims.user_id) {
                    Decision::Allow
                } else {
                    Decision::Deny(Denial::NotOwner)
                }
            }
        }
    }
}
