pub mod macros;
pub mod user;

pub use user::*;
