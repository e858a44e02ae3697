//! I/O layer: decoding images with EXIF orientation applied, listing candidate
//! files under a directory, and the encoders used for writing outputs.
pub mod listing;
pub use listing::{ListFilter, list_visible_files};

pub mod reader;
pub use reader::open_rgb;

pub mod writers;
