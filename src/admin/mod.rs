pub mod handlers;
pub mod password;
pub mod session;
pub mod store;
pub mod types;

pub use handlers::*;
pub use password::{hash_password, verify_password};
pub use session::*;
pub use store::AdminStore;
pub use types::*;
