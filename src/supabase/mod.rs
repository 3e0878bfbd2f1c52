pub mod client;
pub mod tables;
