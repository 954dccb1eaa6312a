pub mod appointments;
pub mod auth;
pub mod health;
pub mod notes;
pub mod parents;

mod utils;
