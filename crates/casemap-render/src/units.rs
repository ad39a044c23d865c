//! Typed coordinate spaces: world feet (y up) and layout page points (y down).

use casemap_core::Extent;
use euclid::{Transform2D, vec2};

/// Map coordinates in the document's working reference system.
#[derive(Debug, Clone, Copy)]
pub struct World;

/// Layout page coordinates in points, origin at the top-left corner.
#[derive(Debug, Clone, Copy)]
pub struct Page;

pub type WorldPoint = euclid::Point2D<f64, World>;
pub type PagePoint = euclid::Point2D<f64, Page>;
pub type PageRect = euclid::Rect<f64, Page>;
pub type WorldToPage = Transform2D<f64, World, Page>;

pub fn page_rect(x: f64, y: f64, width: f64, height: f64) -> PageRect {
    euclid::rect(x, y, width, height)
}

/// Maps `view` onto `frame`: the view's top-left corner lands on the frame's top-left corner and
/// the view's width spans the frame's width.
pub fn world_to_page(view: &Extent, frame: &PageRect) -> WorldToPage {
    let width = view.width();
    let s = if width > 0.0 {
        frame.size.width / width
    } else {
        1.0
    };
    WorldToPage::translation(-view.min_x, -view.max_y)
        .then_scale(s, -s)
        .then_translate(vec2(frame.origin.x, frame.origin.y))
}
