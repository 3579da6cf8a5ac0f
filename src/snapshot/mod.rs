pub mod matcher;
pub mod snapshot_model;
