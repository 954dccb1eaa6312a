pub mod appointment;
pub mod medical_note;
pub mod parent;
pub mod session;
pub mod user;

pub use appointment::Appointment;
pub use medical_note::MedicalNote;
pub use parent::Parent;
pub use session::Session;
pub use user::User;
