pub mod catalog;

pub use catalog::{CatalogError, CatalogStore, LoadState, to_pretty_json, write_atomic};
