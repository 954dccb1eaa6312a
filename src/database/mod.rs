pub mod filter;
pub mod gateway;
pub mod manager;
pub mod models;
