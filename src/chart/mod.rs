//! SVG chart renderers. Each `render` clears its surface before drawing, so
//! re-rendering into the same canvas never accumulates content.

pub mod bar;
pub mod canvas;
pub mod line;
pub mod radar;

pub use canvas::SvgCanvas;
