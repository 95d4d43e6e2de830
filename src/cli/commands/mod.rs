pub mod config;
pub mod tenant;
pub mod token;
