pub mod settings;

pub use settings::CatalogConfig;
