//! Model discovery and selection
//!
//! `ModelCatalog` fetches and caches what the gateway offers;
//! `ModelSelector` turns a catalog snapshot and a mode into a primary model
//! and fallback chain.

pub mod catalog;
pub mod descriptor;
pub mod selector;

pub use catalog::{CatalogSnapshot, ModelCatalog};
pub use descriptor::{CatalogPayload, ModelDescriptor};
pub use selector::{Mode, ModelSelector, PinnedModels, Selection, is_reasoning_capable};
