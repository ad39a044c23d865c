#![forbid(unsafe_code)]

//! `casemap` builds land-use case map exhibits headlessly.
//!
//! The core pipeline lives in `casemap-core` and is re-exported here unchanged.
//!
//! # Features
//!
//! - `render`: enable SVG rendering of layouts (`casemap::render`)
//! - `pdf`: enable PDF export of layouts via pure-Rust SVG conversion

pub use casemap_core::*;

#[cfg(feature = "render")]
pub mod render {
    pub use casemap_render::units::{Page, World, WorldToPage, world_to_page};
    pub use casemap_render::{SvgRenderOptions, render_layout_svg};

    #[cfg(feature = "pdf")]
    pub mod pdf;

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Store(#[from] casemap_core::StoreError),
        #[error(transparent)]
        Render(#[from] casemap_render::Error),
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Opens a project file and renders one of its layouts to SVG.
    pub fn render_project_layout(
        path: impl AsRef<std::path::Path>,
        layout: &str,
        options: &SvgRenderOptions,
    ) -> Result<String> {
        let project = casemap_core::Project::open(path)?;
        Ok(render_layout_svg(&project, layout, options)?)
    }
}
