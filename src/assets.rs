pub mod files;
pub mod png;
