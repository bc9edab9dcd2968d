use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Pet {
    pub id: i64,
    pub name: String,
    pub species: String,
    pub breed: String,
    pub owner_id: i64,
    pub history: String,
}

/// Body of POST and PUT /pets
///
/// `owner_id` is ignored for owner-role callers and required otherwise.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPet {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 100))]
    pub species: String,

    #[serde(default)]
    #[validate(length(max = 100))]
    pub breed: String,

    #[serde(default)]
    pub owner_id: Option<i64>,

    #[serde(default)]
    pub history: String,
}

impl NewPet {
    pub fn into_pet(self, id: i64, owner_id: i64) -> Pet {
        Pet {
            id,
            name: self.name,
            species: self.species,
            breed: self.breed,
            owner_id,
            history: self.history,
        }
    }
}
