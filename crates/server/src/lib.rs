pub mod config;
pub mod error;
pub mod render;
pub mod routes;
pub mod session;
pub mod storage;
