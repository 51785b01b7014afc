mod health_check;
mod tokens;
mod users;
mod webhooks;

pub use health_check::health_check;
pub use tokens::{refresh, revoke};
pub use users::{create_user, login, update_user};
pub use webhooks::polka_webhook;
