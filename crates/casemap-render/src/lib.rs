#![forbid(unsafe_code)]

//! Headless SVG rendering of case map layouts.
//!
//! A layout renders to one SVG page in points: each map frame draws its map's layers clipped to
//! the frame, then the layout's text elements are drawn on top.

pub mod fmt;
pub mod svg;
pub mod units;

pub use svg::{SvgRenderOptions, render_layout_svg};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("layout `{0}` not found")]
    LayoutNotFound(String),
    #[error("map `{map}` drawn by frame `{frame}` not found")]
    MapNotFound { frame: String, map: String },
    #[error("map frame `{frame}` has a degenerate size {width}x{height}")]
    DegenerateFrame { frame: String, width: f64, height: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
