use crate::fmt::{escape_xml_into, fmt_into};
use crate::units::{WorldToPage, page_rect, world_to_page};
use crate::{Error, Result};
use casemap_core::Extent;
use casemap_core::project::{Layer, Layout, MapFrame, Project};
use euclid::point2;
use geo::LineString;
use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub struct SvgRenderOptions {
    /// Page fill; `None` leaves the page transparent.
    pub background: Option<String>,
    pub font_family: String,
    /// Draws a thin neatline around every map frame.
    pub frame_border: bool,
}

impl Default for SvgRenderOptions {
    fn default() -> Self {
        Self {
            background: Some("white".to_string()),
            font_family: "Helvetica, Arial, sans-serif".to_string(),
            frame_border: true,
        }
    }
}

/// Renders the named layout of `project` as a standalone SVG document.
pub fn render_layout_svg(
    project: &Project,
    layout: &str,
    options: &SvgRenderOptions,
) -> Result<String> {
    let layout = project
        .layout(layout)
        .ok_or_else(|| Error::LayoutNotFound(layout.to_string()))?;

    let mut out = String::new();
    let (w, h) = (layout.width, layout.height);
    out.push_str(r#"<svg xmlns="http://www.w3.org/2000/svg" width=""#);
    fmt_into(&mut out, w);
    out.push_str(r#"pt" height=""#);
    fmt_into(&mut out, h);
    out.push_str(r#"pt" viewBox="0 0 "#);
    fmt_into(&mut out, w);
    out.push(' ');
    fmt_into(&mut out, h);
    out.push_str("\">\n");

    if let Some(fill) = &options.background {
        out.push_str(r#"<rect x="0" y="0" width=""#);
        fmt_into(&mut out, w);
        out.push_str(r#"" height=""#);
        fmt_into(&mut out, h);
        out.push_str(r#"" fill=""#);
        escape_xml_into(&mut out, fill);
        out.push_str("\"/>\n");
    }

    for (idx, frame) in layout.frames.iter().enumerate() {
        render_frame(&mut out, project, idx, frame, options)?;
    }
    render_texts(&mut out, layout, options);

    out.push_str("</svg>\n");
    tracing::debug!(layout = %layout.name, bytes = out.len(), "rendered layout svg");
    Ok(out)
}

fn frame_rect_attrs(out: &mut String, frame: &MapFrame) {
    out.push_str(r#"x=""#);
    fmt_into(out, frame.x);
    out.push_str(r#"" y=""#);
    fmt_into(out, frame.y);
    out.push_str(r#"" width=""#);
    fmt_into(out, frame.width);
    out.push_str(r#"" height=""#);
    fmt_into(out, frame.height);
    out.push('"');
}

/// The frame's stored view, or the full extent of its map fitted to the frame.
fn frame_view(frame: &MapFrame, layers: &[Layer]) -> Option<Extent> {
    if let Some(view) = &frame.view {
        return Some(view.extent);
    }
    layers
        .iter()
        .filter_map(Layer::extent)
        .reduce(|a, b| a.union(&b))
        .map(|e| e.fit_aspect(frame.width / frame.height))
}

fn render_frame(
    out: &mut String,
    project: &Project,
    idx: usize,
    frame: &MapFrame,
    options: &SvgRenderOptions,
) -> Result<()> {
    if !(frame.width > 0.0 && frame.height > 0.0) {
        return Err(Error::DegenerateFrame {
            frame: frame.name.clone(),
            width: frame.width,
            height: frame.height,
        });
    }
    let map = project.map(&frame.map).ok_or_else(|| Error::MapNotFound {
        frame: frame.name.clone(),
        map: frame.map.clone(),
    })?;

    let _ = write!(out, r#"<clipPath id="frame-{idx}"><rect "#);
    frame_rect_attrs(out, frame);
    out.push_str("/></clipPath>\n");

    out.push_str(r#"<g class="map-frame" data-name=""#);
    escape_xml_into(out, &frame.name);
    let _ = writeln!(out, r#"" clip-path="url(#frame-{idx})">"#);

    if let Some(view) = frame_view(frame, &map.layers) {
        let transform = world_to_page(
            &view,
            &page_rect(frame.x, frame.y, frame.width, frame.height),
        );
        // First layer in the list draws on top.
        for layer in map.layers.iter().rev() {
            render_layer(out, layer, &transform);
        }
    } else {
        tracing::debug!(frame = %frame.name, "frame has nothing to draw");
    }
    out.push_str("</g>\n");

    if options.frame_border {
        out.push_str(r#"<rect class="neatline" "#);
        frame_rect_attrs(out, frame);
        out.push_str(" fill=\"none\" stroke=\"#000000\" stroke-width=\"0.75\"/>\n");
    }
    Ok(())
}

fn push_ring(out: &mut String, ring: &LineString<f64>, transform: &WorldToPage) {
    // Closed rings repeat their first point; `Z` closes the subpath instead.
    let count = ring.0.len().saturating_sub(1);
    for (i, c) in ring.coords().take(count).enumerate() {
        let p = transform.transform_point(point2(c.x, c.y));
        out.push(if i == 0 { 'M' } else { 'L' });
        fmt_into(out, p.x);
        out.push(',');
        fmt_into(out, p.y);
    }
    if count > 0 {
        out.push('Z');
    }
}

fn render_layer(out: &mut String, layer: &Layer, transform: &WorldToPage) {
    out.push_str(r#"<g class="layer" data-name=""#);
    escape_xml_into(out, &layer.name);
    out.push_str("\">\n");
    let style = &layer.style;
    for feature in &layer.features {
        let mut d = String::new();
        for poly in &feature.geometry.0 {
            push_ring(&mut d, poly.exterior(), transform);
            for hole in poly.interiors() {
                push_ring(&mut d, hole, transform);
            }
        }
        if d.is_empty() {
            continue;
        }
        out.push_str(r#"<path fill-rule="evenodd" d=""#);
        out.push_str(&d);
        out.push_str(r#"" fill=""#);
        escape_xml_into(out, &style.fill);
        out.push_str(r#"" fill-opacity=""#);
        fmt_into(out, style.fill_opacity);
        out.push_str(r#"" stroke=""#);
        escape_xml_into(out, &style.stroke);
        out.push_str(r#"" stroke-width=""#);
        fmt_into(out, style.stroke_width);
        out.push_str("\"/>\n");
    }
    out.push_str("</g>\n");
}

fn render_texts(out: &mut String, layout: &Layout, options: &SvgRenderOptions) {
    for text in &layout.texts {
        // Unstamped elements show their template.
        let body = if text.element.text.is_empty() {
            &text.element.template
        } else {
            &text.element.text
        };
        out.push_str(r#"<text class="layout-text" data-name=""#);
        escape_xml_into(out, &text.element.name);
        out.push_str(r#"" x=""#);
        fmt_into(out, text.x);
        out.push_str(r#"" y=""#);
        fmt_into(out, text.y);
        out.push_str(r#"" font-size=""#);
        fmt_into(out, text.font_size);
        out.push_str(r#"" font-family=""#);
        escape_xml_into(out, &options.font_family);
        out.push_str("\">");
        escape_xml_into(out, body);
        out.push_str("</text>\n");
    }
}
