//! Exact-name map lookup and pattern-based layer lookup, first match wins.
//!
//! Extra matches are kept for compatibility but reported as [`Warning::AmbiguousMatch`].

use crate::document::{DocumentStore, LayerRef};
use crate::error::{Error, ResolutionReason, Result, Stage, Warning};

/// A resolved value plus any ambiguity noticed while resolving it.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

fn ambiguity(
    resource_kind: &'static str,
    pattern: &str,
    candidates: Vec<String>,
) -> Option<Warning> {
    if candidates.len() < 2 {
        return None;
    }
    let warning = Warning::AmbiguousMatch {
        stage: Stage::LayerResolution,
        resource_kind,
        pattern: pattern.to_string(),
        chosen: candidates[0].clone(),
        candidates,
    };
    tracing::warn!("{warning}");
    Some(warning)
}

/// Index of the first map named exactly `map`.
pub fn resolve_map<D: DocumentStore + ?Sized>(store: &D, map: &str) -> Result<Resolved<usize>> {
    let names = store.map_names();
    let mut hits = names
        .iter()
        .enumerate()
        .filter(|(_, name)| name.as_str() == map)
        .map(|(i, _)| i);
    let Some(index) = hits.next() else {
        return Err(Error::resolution(
            Stage::LayerResolution,
            format_args!("map `{map}`"),
            ResolutionReason::MapNotFound,
        ));
    };
    let duplicates = hits.count();
    let candidates = vec![map.to_string(); duplicates + 1];
    Ok(Resolved {
        value: index,
        warnings: ambiguity("map", map, candidates).into_iter().collect(),
    })
}

/// First layer of `map` matching `pattern`.
pub fn resolve_layer<D: DocumentStore + ?Sized>(
    store: &D,
    map: &str,
    pattern: &str,
) -> Result<Resolved<LayerRef>> {
    let Resolved {
        value: map_index,
        mut warnings,
    } = resolve_map(store, map)?;
    let matches = store.find_layers(map_index, pattern).map_err(|source| {
        Error::store(Stage::LayerResolution, format_args!("map `{map}`"), source)
    })?;
    let Some(first) = matches.first().cloned() else {
        return Err(Error::resolution(
            Stage::LayerResolution,
            format_args!("map `{map}`"),
            ResolutionReason::NoMatchingLayer {
                pattern: pattern.to_string(),
            },
        ));
    };
    let candidates = matches.iter().map(|l| l.layer().to_string()).collect();
    warnings.extend(ambiguity("layer", pattern, candidates));
    tracing::debug!(layer = %first, "resolved layer");
    Ok(Resolved {
        value: first,
        warnings,
    })
}

/// Checks that a layout named exactly `layout` exists and holds a map frame named `frame` with a
/// usable page size.
pub fn resolve_frame<D: DocumentStore + ?Sized>(
    store: &D,
    layout: &str,
    frame: &str,
) -> Result<Resolved<()>> {
    let hits = store
        .layout_names()
        .into_iter()
        .filter(|name| name == layout)
        .count();
    if hits == 0 {
        return Err(Error::resolution(
            Stage::LayerResolution,
            format_args!("layout `{layout}`"),
            ResolutionReason::LayoutNotFound,
        ));
    }
    let frames = store.map_frame_names(layout).map_err(|source| {
        Error::store(Stage::LayerResolution, format_args!("layout `{layout}`"), source)
    })?;
    let frame_hits: Vec<String> = frames.into_iter().filter(|f| f == frame).collect();
    if frame_hits.is_empty() {
        return Err(Error::resolution(
            Stage::LayerResolution,
            format_args!("layout `{layout}`"),
            ResolutionReason::FrameNotFound {
                frame: frame.to_string(),
            },
        ));
    }
    let (width, height) = store.frame_size(layout, frame).map_err(|source| {
        Error::store(Stage::LayerResolution, format_args!("layout `{layout}`"), source)
    })?;
    let usable = |v: f64| v.is_finite() && v > 0.0;
    if !(usable(width) && usable(height)) {
        return Err(Error::resolution(
            Stage::LayerResolution,
            format_args!("layout `{layout}`"),
            ResolutionReason::DegenerateFrame {
                frame: frame.to_string(),
                width,
                height,
            },
        ));
    }
    let mut warnings: Vec<Warning> = ambiguity("layout", layout, vec![layout.to_string(); hits])
        .into_iter()
        .collect();
    warnings.extend(ambiguity("map frame", frame, frame_hits));
    Ok(Resolved {
        value: (),
        warnings,
    })
}
