pub mod files;
pub mod repo;
