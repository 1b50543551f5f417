pub mod errors;
pub mod file_types;
pub mod portal_items;

pub use errors::ManifestError;
pub use file_types::{FileTypes, load_file_types};
pub use portal_items::{PortalItem, PortalItems, load_portal_items};
