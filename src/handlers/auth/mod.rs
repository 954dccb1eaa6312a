mod login;
mod logout;
mod register;
mod utils;

pub use login::login;
pub use logout::logout;
pub use register::register;
