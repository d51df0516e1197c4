pub mod chat;
pub mod extract;
pub mod menu;
pub mod utils;
