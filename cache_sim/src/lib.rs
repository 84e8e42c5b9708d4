pub mod addr;
pub mod cache;
pub mod config;
mod mapping;
pub mod report;
pub mod sim;
pub mod trace;

#[cfg(feature = "stat")]
pub mod stat;
