use crate::document::StoreError;
use crate::geom::Geometry;
use geo::{BooleanOps, Centroid, Coord, Intersects, LineString, Polygon};
use std::f64::consts::PI;

/// Segments used to approximate the round joins of a buffer.
pub const DISC_SEGMENTS: usize = 32;

/// Union of all geometries, merged pairwise so each boolean op sees inputs of similar size.
pub(crate) fn union_all(mut parts: Vec<Geometry>) -> Geometry {
    parts.retain(|g| !g.0.is_empty());
    if parts.is_empty() {
        return Geometry::new(vec![]);
    }
    while parts.len() > 1 {
        let mut next = Vec::with_capacity(parts.len().div_ceil(2));
        let mut it = parts.into_iter();
        while let Some(a) = it.next() {
            match it.next() {
                Some(b) => next.push(a.union(&b)),
                None => next.push(a),
            }
        }
        parts = next;
    }
    parts.pop().unwrap_or_else(|| Geometry::new(vec![]))
}

fn check_finite(geometry: &Geometry) -> Result<(), StoreError> {
    let finite = geometry.0.iter().all(|poly| {
        std::iter::once(poly.exterior())
            .chain(poly.interiors())
            .flat_map(|ring| ring.coords())
            .all(|c| c.x.is_finite() && c.y.is_finite())
    });
    if finite {
        Ok(())
    } else {
        Err(StoreError::Geometry("non-finite coordinate".to_string()))
    }
}

/// One geometry covering every input with shared boundaries removed.
pub fn dissolve_geometries<'a>(
    geometries: impl IntoIterator<Item = &'a Geometry>,
) -> Result<Geometry, StoreError> {
    let parts = geometries.into_iter().cloned().collect::<Vec<_>>();
    for part in &parts {
        check_finite(part)?;
    }
    let merged = union_all(parts);
    if merged.0.is_empty() {
        return Err(StoreError::Geometry("nothing to dissolve".to_string()));
    }
    Ok(merged)
}

/// Regular polygon around `center` whose inscribed circle has radius `r`.
///
/// Vertices sit half a step off the axes, so the edges facing +x, -x, +y and -y are exactly `r`
/// away and axis-aligned extents of the buffer come out exact.
fn disc(center: Coord<f64>, r: f64) -> Polygon<f64> {
    let step = 2.0 * PI / DISC_SEGMENTS as f64;
    let circumradius = r / (PI / DISC_SEGMENTS as f64).cos();
    let ring = (0..DISC_SEGMENTS)
        .map(|k| {
            let a = (k as f64 + 0.5) * step;
            Coord {
                x: center.x + circumradius * a.cos(),
                y: center.y + circumradius * a.sin(),
            }
        })
        .collect::<Vec<_>>();
    Polygon::new(LineString::from(ring), vec![])
}

/// Rectangle sweeping the edge `a -> b` sideways by `r` in both directions.
fn edge_band(a: Coord<f64>, b: Coord<f64>, r: f64) -> Option<Polygon<f64>> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len = dx.hypot(dy);
    if len <= f64::EPSILON {
        return None;
    }
    let (nx, ny) = (-dy / len * r, dx / len * r);
    Some(Polygon::new(
        LineString::from(vec![
            Coord { x: a.x + nx, y: a.y + ny },
            Coord { x: b.x + nx, y: b.y + ny },
            Coord { x: b.x - nx, y: b.y - ny },
            Coord { x: a.x - nx, y: a.y - ny },
        ]),
        vec![],
    ))
}

/// Outward offset of `geometry` by `distance`, as the Minkowski sum with a disc.
///
/// Holes narrower than twice the distance close up. A zero distance returns the dissolved input.
pub fn buffer_geometry(geometry: &Geometry, distance: f64) -> Result<Geometry, StoreError> {
    if !distance.is_finite() || distance < 0.0 {
        return Err(StoreError::Geometry(format!(
            "buffer distance must be a non-negative number, got {distance}"
        )));
    }
    check_finite(geometry)?;
    if geometry.0.is_empty() {
        return Err(StoreError::Geometry("nothing to buffer".to_string()));
    }
    let mut parts = vec![geometry.clone()];
    if distance > 0.0 {
        for poly in &geometry.0 {
            for ring in std::iter::once(poly.exterior()).chain(poly.interiors()) {
                for line in ring.lines() {
                    if let Some(band) = edge_band(line.start, line.end, distance) {
                        parts.push(Geometry::new(vec![band]));
                    }
                }
                for c in ring.coords() {
                    parts.push(Geometry::new(vec![disc(*c, distance)]));
                }
            }
        }
    }
    tracing::trace!(parts = parts.len(), distance, "buffer union");
    Ok(union_all(parts))
}

/// Whether the centroid of `geometry` lies in or on `boundary`.
pub(crate) fn centroid_within(geometry: &Geometry, boundary: &Geometry) -> bool {
    geometry
        .centroid()
        .is_some_and(|point| point.intersects(boundary))
}
