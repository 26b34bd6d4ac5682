// Library entry shared by the binary and the integration tests

pub mod config;
pub mod constants;
pub mod core;
pub mod models;
pub mod player;
pub mod services;
pub mod utils;

#[cfg(test)]
mod test_utils;
