//! Typed page content: block model, tree fetching, render helpers

pub mod block;
pub mod fetch;
pub mod render;
