#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![no_std]

extern crate alloc;

mod geometry;
mod hash;
mod host;

pub use geometry::*;
pub use hash::*;
pub use host::*;
