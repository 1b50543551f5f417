pub mod paths;

pub use paths::{DestinationResolver, is_zip};
