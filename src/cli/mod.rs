pub mod files;
pub mod output;
