pub mod auth;

pub use auth::{Claims, CurrentUser, MaybeUser};
