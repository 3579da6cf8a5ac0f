pub mod advisor;
pub mod error;
