pub mod api;
pub mod billboard;
pub mod events;
pub mod feed;
pub mod models;
