#![forbid(unsafe_code)]

use geo::BoundingRect;
use serde::{Deserialize, Serialize};

/// Polygonal geometry of one feature. Multi-part parcels keep every part.
pub type Geometry = geo::MultiPolygon<f64>;

/// Axis-aligned rectangle in the document's working coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: max_x.max(min_x),
            max_y: max_y.max(min_y),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut it = points.into_iter();
        let (x0, y0) = it.next()?;
        let mut b = Self {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for (x, y) in it {
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
        Some(b)
    }

    pub fn of_geometry(geometry: &Geometry) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        Some(Self::new(
            rect.min().x,
            rect.min().y,
            rect.max().x,
            rect.max().y,
        ))
    }

    pub fn of_geometries<'a>(geometries: impl IntoIterator<Item = &'a Geometry>) -> Option<Self> {
        geometries
            .into_iter()
            .filter_map(Self::of_geometry)
            .reduce(|a, b| a.union(&b))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn contains(&self, other: &Self) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// Same centre, both sides multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let (cx, cy) = self.center();
        let hw = self.width() * factor / 2.0;
        let hh = self.height() * factor / 2.0;
        Self::new(cx - hw, cy - hh, cx + hw, cy + hh)
    }

    /// Smallest extent with the given width/height ratio that contains `self`, same centre.
    ///
    /// Degenerate sides are widened to one unit first so the result always has area.
    pub fn fit_aspect(&self, aspect: f64) -> Self {
        let (cx, cy) = self.center();
        let mut w = self.width().max(1.0);
        let mut h = self.height().max(1.0);
        if aspect.is_finite() && aspect > 0.0 {
            if w / h < aspect {
                w = h * aspect;
            } else {
                h = w / aspect;
            }
        }
        Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }
}
