//! # cc-search shared types
//!
//! Document types exchanged between the provisioning core and the cc-search
//! service. Field names follow the cc-search JSON wire format.

mod content_type;
mod document;

pub use content_type::{ContentType, UnknownContentType};
pub use document::{SearchDocument, SearchPerson};
