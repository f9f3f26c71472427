pub mod api;
pub mod collection;
pub mod deck;
pub mod models;
pub mod utils;
