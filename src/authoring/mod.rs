pub mod document;
pub mod loader;
pub mod reverse;
pub mod template;

pub use document::{AuthoringDocument, AuthoringModule};
pub use loader::{load_and_register, register_document, resolve_module_entries};
pub use reverse::{
    ExportReport, ReverseOutput, clear_directory, export_images, is_empty_dir, reverse_generate,
    reverse_generate_with_modules,
};
pub use template::blank_document;
