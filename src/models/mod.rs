// Core data models
// These structs represent the domain entities

pub mod entry;
pub mod window;

pub use entry::*;
pub use window::*;
