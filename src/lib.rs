pub mod config;
pub mod errors;
pub mod handlers;
pub mod ident;
pub mod models;
pub mod schema;
pub mod storage;
pub mod sweeper;
pub mod validate;
