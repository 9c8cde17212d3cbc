pub mod cache;
pub mod health;
pub mod root;
pub mod users;

pub use cache::{get_value, set_value};
pub use health::health_check;
pub use root::{banner, method_not_allowed, route_not_found};
pub use users::{create_user, list_users};
