pub mod cache;
pub mod download;
pub mod update;
