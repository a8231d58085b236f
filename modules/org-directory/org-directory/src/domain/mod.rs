pub mod error;
pub mod filter;
pub mod geo;
pub mod hierarchy;
pub mod local_client;
pub mod phone;
pub mod repo;
pub mod service;

#[cfg(test)]
mod service_test;
