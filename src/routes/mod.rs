mod auth;
mod health_check;
mod users;

pub use auth::{authenticate, logout, refresh_from_cookie, refresh_from_form};
pub use health_check::health_check;
pub use users::get_user;
