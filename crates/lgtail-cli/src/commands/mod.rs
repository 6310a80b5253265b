pub mod files;
pub mod read;
