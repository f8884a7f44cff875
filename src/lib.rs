pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod models;
pub mod router;
pub mod storage;
pub mod store;

#[cfg(test)]
pub mod testing;
