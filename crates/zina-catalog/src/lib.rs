pub mod client;
pub mod envelope;
pub mod error;
pub mod pagination;
pub mod sample;
pub mod types;

pub use client::{CatalogClient, ProductPage};
pub use error::CatalogError;
pub use pagination::PageMeta;
pub use types::{CategoryDraft, ImageUpload, ProductDraft, RemoteSession, RemoteUser};
