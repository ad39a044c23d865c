//! In-memory, JSON-backed document store.
//!
//! A project holds maps (each an ordered list of feature layers) and page layouts (map frames
//! plus templated text). Selections and cached layer extents live only in memory.

mod geometry;
mod pattern;
mod store;

pub use geometry::{DISC_SEGMENTS, buffer_geometry, dissolve_geometries};

use crate::document::{LayerRef, StoreError, TextElement, ViewState};
use crate::feature::{Feature, FieldDef};
use crate::geom::Extent;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    /// CSS color, or `none`.
    pub fill: String,
    pub fill_opacity: f64,
    pub stroke: String,
    pub stroke_width: f64,
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            fill: "none".to_string(),
            fill_opacity: 1.0,
            stroke: "#333333".to_string(),
            stroke_width: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub style: LayerStyle,
    #[serde(skip)]
    selection: Option<Vec<usize>>,
    #[serde(skip)]
    extent: Option<Extent>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            features: Vec::new(),
            style: LayerStyle::default(),
            selection: None,
            extent: None,
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldDef>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = features;
        self.extent = Extent::of_geometries(self.features.iter().map(|f| &f.geometry));
        self
    }

    pub fn with_style(mut self, style: LayerStyle) -> Self {
        self.style = style;
        self
    }

    /// Cached extent as of the last refresh.
    pub fn extent(&self) -> Option<Extent> {
        self.extent
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDoc {
    pub name: String,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl MapDoc {
    pub fn new(name: impl Into<String>, layers: Vec<Layer>) -> Self {
        Self {
            name: name.into(),
            layers,
        }
    }
}

/// A map frame on a layout page. Page units are points, origin top-left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapFrame {
    pub name: String,
    pub map: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub view: Option<ViewState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutText {
    #[serde(flatten)]
    pub element: TextElement,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
}

fn default_font_size() -> f64 {
    12.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub name: String,
    /// Page width in points.
    pub width: f64,
    /// Page height in points.
    pub height: f64,
    #[serde(default)]
    pub frames: Vec<MapFrame>,
    #[serde(default)]
    pub texts: Vec<LayoutText>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub maps: Vec<MapDoc>,
    #[serde(default)]
    pub layouts: Vec<Layout>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Project {
    pub fn new(maps: Vec<MapDoc>, layouts: Vec<Layout>) -> Self {
        Self {
            maps,
            layouts,
            path: None,
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, StoreError> {
        let mut project: Self = serde_json::from_str(text)?;
        project.refresh_all_extents();
        Ok(project)
    }

    /// Loads a project file; [`crate::DocumentStore::save`] writes back to the same path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut project = Self::from_json_str(&text)?;
        project.path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), maps = project.maps.len(), "opened project");
        Ok(project)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn layout(&self, name: &str) -> Option<&Layout> {
        self.layouts.iter().find(|l| l.name == name)
    }

    pub fn map(&self, name: &str) -> Option<&MapDoc> {
        self.maps.iter().find(|m| m.name == name)
    }

    /// Cached extent of a layer as of its last refresh.
    pub fn layer_extent(&self, layer: &LayerRef) -> Option<Extent> {
        self.layer(layer).ok().and_then(Layer::extent)
    }

    pub fn layer_fields(&self, layer: &LayerRef) -> Result<&[FieldDef], StoreError> {
        Ok(&self.layer(layer)?.fields)
    }

    fn refresh_all_extents(&mut self) {
        for layer in self.maps.iter_mut().flat_map(|m| m.layers.iter_mut()) {
            layer.extent = Extent::of_geometries(layer.features.iter().map(|f| &f.geometry));
        }
    }

    pub(crate) fn layer(&self, layer: &LayerRef) -> Result<&Layer, StoreError> {
        self.maps
            .get(layer.map_index())
            .and_then(|m| m.layers.get(layer.layer_index()))
            .filter(|l| l.name == layer.layer())
            .ok_or_else(|| StoreError::LayerNotFound(layer.clone()))
    }

    pub(crate) fn layer_mut(&mut self, layer: &LayerRef) -> Result<&mut Layer, StoreError> {
        self.maps
            .get_mut(layer.map_index())
            .and_then(|m| m.layers.get_mut(layer.layer_index()))
            .filter(|l| l.name == layer.layer())
            .ok_or_else(|| StoreError::LayerNotFound(layer.clone()))
    }

    pub(crate) fn layout_mut(&mut self, name: &str) -> Result<&mut Layout, StoreError> {
        self.layouts
            .iter_mut()
            .find(|l| l.name == name)
            .ok_or_else(|| StoreError::LayoutNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocumentStore;
    use crate::tests::fixtures;

    #[test]
    fn json_round_trip_keeps_layers_and_layouts() {
        let project = fixtures::case_project();
        let text = serde_json::to_string(&project).unwrap();
        let back = Project::from_json_str(&text).unwrap();
        assert_eq!(back.maps.len(), project.maps.len());
        assert_eq!(back.layouts, project.layouts);
        let parcels = fixtures::parcels_ref(&back);
        assert_eq!(back.feature_count(&parcels).unwrap(), 4);
        assert!(back.layer_extent(&parcels).is_some());
    }

    #[test]
    fn open_and_save_use_the_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.json");
        fixtures::case_project().save_to(&path).unwrap();

        let mut project = Project::open(&path).unwrap();
        assert_eq!(project.path(), Some(path.as_path()));
        let subject = fixtures::subject_ref(&project);
        project.delete_all(&subject).unwrap();
        project.save().unwrap();

        let reopened = Project::open(&path).unwrap();
        assert_eq!(reopened.feature_count(&subject).unwrap(), 0);
    }

    #[test]
    fn stale_layer_refs_are_rejected() {
        let project = fixtures::case_project();
        let bogus = LayerRef::new(0, fixtures::MAP, 0, "Renamed");
        assert!(matches!(
            project.feature_count(&bogus),
            Err(StoreError::LayerNotFound(_))
        ));
    }
}
