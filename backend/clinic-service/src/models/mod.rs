pub mod appointment;
pub mod owner;
pub mod pet;
pub mod user;

pub use appointment::{Appointment, NewAppointment};
pub use owner::{NewOwner, Owner};
pub use pet::{NewPet, Pet};
pub use user::User;
