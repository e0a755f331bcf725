mod gender;
mod user;

pub use gender::Gender;
pub use user::{User, UsersResponse};
