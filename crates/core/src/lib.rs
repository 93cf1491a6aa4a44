//! `shelfkeeper-core`: catalog data model building blocks.
//!
//! This crate contains **pure** catalog types (no filesystem, no HTTP). The
//! store crate owns persistence and locking on top of these.

pub mod entity;
pub mod error;
pub mod id;
pub mod model;
pub mod patch;

pub use entity::{Entity, find, find_mut};
pub use error::{CatalogError, CatalogResult, Level};
pub use id::EntityId;
pub use model::{ASSET_PREFIX, AssetRef, Brand, Catalog, Category, NewProduct, Product};
pub use patch::{Patch, ProductPatch};
