use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Owner {
    pub id: i64,
    pub name: String,
    pub contact: String,
    pub email: String,
}

impl Owner {
    /// Owner records are keyed by their own id
    pub fn owner_key(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewOwner {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 200))]
    pub contact: String,

    #[validate(email)]
    pub email: String,
}

impl NewOwner {
    pub fn into_owner(self, id: i64) -> Owner {
        Owner {
            id,
            name: self.name,
            contact: self.contact,
            email: self.email,
        }
    }
}
