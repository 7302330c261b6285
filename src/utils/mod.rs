// Date/time parsing and hour formatting shared across the crate

pub mod time;

pub use time::*;
