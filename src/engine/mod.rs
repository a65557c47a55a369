// Conversion engine - independent of any front end

pub mod core;
pub mod worker;

pub use core::*;
