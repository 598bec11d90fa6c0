//! Handler adapter: typed handlers in, JSON procedures out.

mod core;

pub use core::*;

#[cfg(test)]
mod tests;
