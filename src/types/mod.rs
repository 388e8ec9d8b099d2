//! Domain types shared across the tool

mod record;
mod target;

pub use record::*;
pub use target::*;
