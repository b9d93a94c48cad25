pub mod get;
pub mod update;
pub mod upload;
