mod handlers;
mod store;
mod types;

pub use handlers::{
    create_photo_handler, delete_photo_handler, list_photos_handler, update_photo_handler,
};
pub use store::{PhotoStore, generate_photo_id, slugify};
pub use types::*;
