#![forbid(unsafe_code)]

use crate::render::{SvgRenderOptions, render_layout_svg};
use casemap_core::Project;
use casemap_core::document::{LayoutExporter, StoreError};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error(transparent)]
    Render(#[from] casemap_render::Error),
    #[error("failed to parse SVG: {0}")]
    SvgParse(String),
    #[error("failed to convert SVG to PDF")]
    PdfConvert,
    #[error("resolution must be positive")]
    Resolution,
}

pub type Result<T> = std::result::Result<T, PdfError>;

/// Points per inch; layout pages are measured in points.
const POINTS_PER_INCH: f32 = 72.0;
/// CSS pixels per inch, which usvg uses to resolve `pt` lengths.
const CSS_PX_PER_INCH: f32 = 96.0;

/// Converts an SVG document to a one-page PDF.
///
/// Vector content stays vector; `dpi` only sets the rasterization scale of embedded effects.
pub fn svg_to_pdf(svg: &str, dpi: u32) -> Result<Vec<u8>> {
    if dpi == 0 {
        return Err(PdfError::Resolution);
    }
    let mut opt = svg2pdf::usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = "Arial".to_string();

    let tree = svg2pdf::usvg::Tree::from_str(svg, &opt)
        .map_err(|err| PdfError::SvgParse(err.to_string()))?;

    let mut conversion = svg2pdf::ConversionOptions::default();
    conversion.raster_scale = dpi as f32 / POINTS_PER_INCH;
    let mut page = svg2pdf::PageOptions::default();
    // One SVG `pt` becomes one PDF point.
    page.dpi = CSS_PX_PER_INCH;

    svg2pdf::to_pdf(&tree, conversion, page).map_err(|_| PdfError::PdfConvert)
}

pub fn render_layout_pdf(
    project: &Project,
    layout: &str,
    options: &SvgRenderOptions,
    dpi: u32,
) -> Result<Vec<u8>> {
    let svg = render_layout_svg(project, layout, options)?;
    svg_to_pdf(&svg, dpi)
}

/// Writes layouts of a [`Project`] to PDF files.
#[derive(Debug, Clone, Default)]
pub struct PdfExporter {
    pub svg: SvgRenderOptions,
}

impl LayoutExporter<Project> for PdfExporter {
    fn export_layout(
        &self,
        doc: &Project,
        layout: &str,
        path: &Path,
        resolution: u32,
    ) -> std::result::Result<(), StoreError> {
        let bytes = render_layout_pdf(doc, layout, &self.svg, resolution)
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        std::fs::write(path, &bytes)?;
        tracing::debug!(layout, path = %path.display(), bytes = bytes.len(), "wrote pdf");
        Ok(())
    }
}
