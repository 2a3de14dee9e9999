pub mod plugin;
pub mod volumes;

// Re-export handler functions
pub use plugin::*;
pub use volumes::*;
