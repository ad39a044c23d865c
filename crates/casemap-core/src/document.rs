//! The document/project store the pipeline works against.
//!
//! The store owns maps, layers, layouts and the geometry engine. The pipeline only drives it
//! through [`DocumentStore`]; [`crate::Project`] is the in-memory implementation.

use crate::feature::{AttrValue, Feature, FieldDef, FieldKind};
use crate::geom::Extent;
use crate::query::AttributeQuery;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Handle to a layer resolved inside a map.
///
/// Valid only for the document session that produced it. Indices disambiguate maps or layers
/// that share a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LayerRef {
    map_index: usize,
    map: String,
    layer_index: usize,
    layer: String,
}

impl LayerRef {
    pub fn new(
        map_index: usize,
        map: impl Into<String>,
        layer_index: usize,
        layer: impl Into<String>,
    ) -> Self {
        Self {
            map_index,
            map: map.into(),
            layer_index,
            layer: layer.into(),
        }
    }

    pub fn map_index(&self) -> usize {
        self.map_index
    }

    pub fn layer_index(&self) -> usize {
        self.layer_index
    }

    pub fn map(&self) -> &str {
        &self.map
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }
}

impl fmt::Display for LayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer `{}` in map `{}`", self.layer, self.map)
    }
}

/// What a selection against a layer picks.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Features whose attribute matches the predicate.
    Attribute(AttributeQuery),
    /// Features whose centroid falls inside any feature of the given boundary layer.
    CentroidWithin(LayerRef),
    /// Every feature currently stored.
    All,
}

/// Visible rectangle and scale of a map frame after framing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub extent: Extent,
    /// Map scale denominator (`1:scale`), with world units in feet and page units in points.
    pub scale: f64,
}

/// A templated text element on a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    pub name: String,
    /// Text with `{placeholder}` fields.
    pub template: String,
    /// Last stamped text; empty until stamped.
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("map `{0}` not found")]
    MapNotFound(String),
    #[error("{0} not found")]
    LayerNotFound(LayerRef),
    #[error("layout `{0}` not found")]
    LayoutNotFound(String),
    #[error("map frame `{frame}` not found in layout `{layout}`")]
    FrameNotFound { layout: String, frame: String },
    #[error("map frame `{frame}` in layout `{layout}` has an unusable size {width}x{height}")]
    DegenerateFrame {
        layout: String,
        frame: String,
        width: f64,
        height: f64,
    },
    #[error("text element `{element}` not found in layout `{layout}`")]
    TextElementNotFound { layout: String, element: String },
    #[error("field `{field}` not found on {layer}")]
    FieldNotFound { layer: LayerRef, field: String },
    #[error("field `{field}` already exists on {layer} as {existing:?}, not {requested:?}")]
    FieldKindConflict {
        layer: LayerRef,
        field: String,
        existing: FieldKind,
        requested: FieldKind,
    },
    #[error("invalid layer name pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("geometry operation failed: {0}")]
    Geometry(String),
    #[error("{operation} took {elapsed:?}, over the {limit:?} operation budget")]
    Timeout {
        operation: &'static str,
        limit: Duration,
        elapsed: Duration,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Backend(String),
}

/// Operations the pipeline needs from the external document store.
///
/// Selections are per layer and replace any previous selection on that layer. Callers pair
/// every [`DocumentStore::select`] with [`DocumentStore::clear_selection`]; use
/// [`crate::selection::SelectionGuard`] rather than calling them directly.
pub trait DocumentStore {
    /// Map names in document order. Names may repeat.
    fn map_names(&self) -> Vec<String>;

    /// Layout names in document order. Names may repeat.
    fn layout_names(&self) -> Vec<String>;

    /// Map frame names of a layout.
    fn map_frame_names(&self, layout: &str) -> Result<Vec<String>, StoreError>;

    /// Page width and height of a layout's map frame, in points.
    fn frame_size(&self, layout: &str, frame: &str) -> Result<(f64, f64), StoreError>;

    /// Layers of the `map_index`-th map whose name matches `pattern`, in drawing order.
    fn find_layers(&self, map_index: usize, pattern: &str) -> Result<Vec<LayerRef>, StoreError>;

    /// Replaces the layer's selection and returns how many features it holds.
    fn select(&mut self, layer: &LayerRef, selection: &Selection) -> Result<usize, StoreError>;

    /// Features of the active selection; empty when nothing is selected.
    fn selected_features(&self, layer: &LayerRef) -> Result<Vec<Feature>, StoreError>;

    /// Bounding extent of the active selection; `None` when nothing is selected.
    fn selection_extent(&self, layer: &LayerRef) -> Result<Option<Extent>, StoreError>;

    fn clear_selection(&mut self, layer: &LayerRef);

    fn feature_count(&self, layer: &LayerRef) -> Result<usize, StoreError>;

    /// Merges features into one, removing shared internal boundaries. Attributes are dropped.
    fn dissolve(&self, features: &[Feature]) -> Result<Feature, StoreError>;

    /// All-around offset of the features by `distance`, dissolved into one feature.
    fn buffer(&self, features: &[Feature], distance: f64) -> Result<Feature, StoreError>;

    /// Deletes every feature of the layer; returns how many were removed.
    fn delete_all(&mut self, layer: &LayerRef) -> Result<usize, StoreError>;

    /// Appends features to the layer; returns how many were inserted.
    fn insert_all(&mut self, layer: &LayerRef, features: Vec<Feature>)
    -> Result<usize, StoreError>;

    /// Recomputes the layer's cached spatial extent.
    fn refresh_extent(&mut self, layer: &LayerRef) -> Result<Option<Extent>, StoreError>;

    /// Adds a field to the layer schema. Returns `false` when it already exists with that kind.
    fn ensure_field(&mut self, layer: &LayerRef, field: &FieldDef) -> Result<bool, StoreError>;

    /// Writes `value` into `field` on every feature of the layer; returns the feature count.
    fn set_field_value(
        &mut self,
        layer: &LayerRef,
        field: &str,
        value: AttrValue,
    ) -> Result<usize, StoreError>;

    /// Frames a layout's map frame on `extent` widened by `scale_factor` beyond a tight fit.
    fn set_view(
        &mut self,
        layout: &str,
        frame: &str,
        extent: Extent,
        scale_factor: f64,
    ) -> Result<ViewState, StoreError>;

    fn text_elements(&self, layout: &str) -> Result<Vec<TextElement>, StoreError>;

    fn set_text(&mut self, layout: &str, element: &str, text: &str) -> Result<(), StoreError>;

    /// Persists the document.
    fn save(&mut self) -> Result<(), StoreError>;
}

/// Renders a named layout of a document to a PDF file.
pub trait LayoutExporter<D: DocumentStore + ?Sized> {
    fn export_layout(
        &self,
        doc: &D,
        layout: &str,
        path: &Path,
        resolution: u32,
    ) -> Result<(), StoreError>;
}
