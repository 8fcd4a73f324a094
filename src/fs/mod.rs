//! Filesystem module.
//!
//! Provides:
//! - Path and directory management
//! - Filename generation and natural ordering

pub mod naming;
pub mod paths;

pub use naming::{
    archive_entry_name, archive_filename, dotted_extension, is_image_file, natural_cmp,
    page_filename, sanitize_path_component, slice_filename,
};
pub use paths::{
    archive_base, ensure_dir, list_images, progress_file, split_folder, title_folder,
    PROGRESS_FILENAME,
};
