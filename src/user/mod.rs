pub use handlers::{delete_user, find_all_users, find_one_user, list_users, me, update_user};

mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
