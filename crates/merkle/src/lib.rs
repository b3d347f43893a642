#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![no_std]

extern crate alloc;

mod node;
mod queue;
mod query;
mod store;
mod tree;

pub use node::*;
pub use query::*;
pub use queue::*;
pub use store::*;
pub use tree::*;
