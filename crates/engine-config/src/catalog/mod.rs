pub mod bookstore;
pub mod loader;
