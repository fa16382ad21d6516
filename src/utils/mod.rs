pub mod colors;
pub mod error;
pub mod fs;
pub mod logger;
pub mod system;
pub mod validation;
