//! CLI command implementations.

pub mod check;
pub mod liner;
pub mod post;
pub mod render;

pub use check::check_document;
pub use liner::liner;
pub use post::post_document;
pub use render::render_document;
