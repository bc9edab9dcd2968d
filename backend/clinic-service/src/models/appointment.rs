use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Appointment {
    pub id: i64,
    /// Calendar day, serialized as YYYY-MM-DD
    pub date: NaiveDate,
    pub time: String,
    pub pet_id: i64,
    pub reason: String,
    pub owner_id: i64,
}

/// Body of POST and PUT /appointments
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewAppointment {
    pub date: NaiveDate,

    #[validate(length(min = 1, max = 32))]
    pub time: String,

    pub pet_id: i64,

    #[validate(length(min = 1, max = 1000))]
    pub reason: String,

    #[serde(default)]
    pub owner_id: Option<i64>,
}

impl NewAppointment {
    pub fn into_appointment(self, id: i64, owner_id: i64) -> Appointment {
        Appointment {
            id,
            date: self.date,
            time: self.time,
            pet_id: self.pet_id,
            reason: self.reason,
            owner_id,
        }
    }
}
