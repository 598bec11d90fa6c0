//! Documentation model and renderers.
//!
//! A documentation run produces a [`Documentation`] map: route table name
//! to [`RouteGroup`]. It can be written as JSON ([`to_writer`]) or as an
//! HTML page ([`render_html`]).

mod model;
mod render;
#[cfg(test)]
mod tests;

pub use model::{Documentation, Endpoint, RouteGroup};
pub use render::{render_html, to_writer, write_html, RenderError};
