pub mod archive;
pub mod changelog;
pub mod clean;
pub mod diagnostics;
pub mod doctor;
pub mod labels;
pub mod links;
pub mod nul_bytes;
pub mod todos;
pub mod workflows;
