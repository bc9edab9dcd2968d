use crypto_core::Role;
use serde::Serialize;

/// Login account. An owner-role user's id equals the id of its Owner record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
}
