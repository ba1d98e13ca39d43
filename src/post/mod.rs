pub use handlers::{create_post, delete_post, find_all_posts, find_one_post, update_post};

mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
