pub mod client;
pub mod errors;
pub mod filename;
pub mod portal;

pub use errors::RequestError;
