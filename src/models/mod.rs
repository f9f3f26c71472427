pub mod card;
pub mod collection;
pub mod deck;
pub mod http_response;
pub mod settings;
