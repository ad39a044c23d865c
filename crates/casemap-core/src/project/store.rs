use super::{MapFrame, Project};
use super::geometry::{buffer_geometry, centroid_within, dissolve_geometries};
use super::pattern::NamePattern;
use crate::document::{DocumentStore, LayerRef, Selection, StoreError, TextElement, ViewState};
use crate::feature::{AttrValue, Feature, FieldDef};
use crate::geom::{Extent, Geometry};

/// Points per foot at 72 pt per inch.
const POINTS_PER_FOOT: f64 = 12.0 * 72.0;

/// Width and height of `frame`, which must be finite and positive to carry a view.
fn usable_size(layout: &str, frame: &MapFrame) -> Result<(f64, f64), StoreError> {
    let usable = |v: f64| v.is_finite() && v > 0.0;
    if !(usable(frame.width) && usable(frame.height)) {
        return Err(StoreError::DegenerateFrame {
            layout: layout.to_string(),
            frame: frame.name.clone(),
            width: frame.width,
            height: frame.height,
        });
    }
    Ok((frame.width, frame.height))
}

impl DocumentStore for Project {
    fn map_names(&self) -> Vec<String> {
        self.maps.iter().map(|m| m.name.clone()).collect()
    }

    fn layout_names(&self) -> Vec<String> {
        self.layouts.iter().map(|l| l.name.clone()).collect()
    }

    fn map_frame_names(&self, layout: &str) -> Result<Vec<String>, StoreError> {
        let layout = self
            .layout(layout)
            .ok_or_else(|| StoreError::LayoutNotFound(layout.to_string()))?;
        Ok(layout.frames.iter().map(|f| f.name.clone()).collect())
    }

    fn frame_size(&self, layout: &str, frame: &str) -> Result<(f64, f64), StoreError> {
        let target = self
            .layout(layout)
            .ok_or_else(|| StoreError::LayoutNotFound(layout.to_string()))?;
        let slot = target
            .frames
            .iter()
            .find(|f| f.name == frame)
            .ok_or_else(|| StoreError::FrameNotFound {
                layout: layout.to_string(),
                frame: frame.to_string(),
            })?;
        Ok((slot.width, slot.height))
    }

    fn find_layers(&self, map_index: usize, pattern: &str) -> Result<Vec<LayerRef>, StoreError> {
        let map = self
            .maps
            .get(map_index)
            .ok_or_else(|| StoreError::MapNotFound(format!("#{map_index}")))?;
        let pattern = NamePattern::parse(pattern)?;
        Ok(map
            .layers
            .iter()
            .enumerate()
            .filter(|(_, layer)| pattern.matches(&layer.name))
            .map(|(i, layer)| LayerRef::new(map_index, map.name.clone(), i, layer.name.clone()))
            .collect())
    }

    fn select(&mut self, layer: &LayerRef, selection: &Selection) -> Result<usize, StoreError> {
        let picked: Vec<usize> = match selection {
            Selection::All => (0..self.layer(layer)?.features.len()).collect(),
            Selection::Attribute(query) => {
                let target = self.layer(layer)?;
                let known = target.fields.iter().any(|f| f.name == query.field())
                    || target.features.iter().any(|f| f.attr(query.field()).is_some());
                if !known && !target.features.is_empty() {
                    return Err(StoreError::FieldNotFound {
                        layer: layer.clone(),
                        field: query.field().to_string(),
                    });
                }
                target
                    .features
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| {
                        f.attr(query.field())
                            .is_some_and(|v| query.matches(&v.to_string()))
                    })
                    .map(|(i, _)| i)
                    .collect()
            }
            Selection::CentroidWithin(boundary) => {
                let boundary = self.layer(boundary)?;
                let target = self.layer(layer)?;
                target
                    .features
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| {
                        boundary
                            .features
                            .iter()
                            .any(|b| centroid_within(&f.geometry, &b.geometry))
                    })
                    .map(|(i, _)| i)
                    .collect()
            }
        };
        let count = picked.len();
        self.layer_mut(layer)?.selection = Some(picked);
        Ok(count)
    }

    fn selected_features(&self, layer: &LayerRef) -> Result<Vec<Feature>, StoreError> {
        let target = self.layer(layer)?;
        Ok(target
            .selection
            .iter()
            .flatten()
            .filter_map(|&i| target.features.get(i).cloned())
            .collect())
    }

    fn selection_extent(&self, layer: &LayerRef) -> Result<Option<Extent>, StoreError> {
        let target = self.layer(layer)?;
        let Some(selection) = &target.selection else {
            return Ok(None);
        };
        Ok(Extent::of_geometries(
            selection
                .iter()
                .filter_map(|&i| target.features.get(i))
                .map(|f| &f.geometry),
        ))
    }

    fn clear_selection(&mut self, layer: &LayerRef) {
        if let Ok(target) = self.layer_mut(layer) {
            target.selection = None;
        }
    }

    fn feature_count(&self, layer: &LayerRef) -> Result<usize, StoreError> {
        Ok(self.layer(layer)?.features.len())
    }

    fn dissolve(&self, features: &[Feature]) -> Result<Feature, StoreError> {
        let merged = dissolve_geometries(features.iter().map(|f| &f.geometry))?;
        Ok(Feature::new(merged))
    }

    fn buffer(&self, features: &[Feature], distance: f64) -> Result<Feature, StoreError> {
        let parts = Geometry::new(
            features
                .iter()
                .flat_map(|f| f.geometry.0.iter().cloned())
                .collect(),
        );
        Ok(Feature::new(buffer_geometry(&parts, distance)?))
    }

    fn delete_all(&mut self, layer: &LayerRef) -> Result<usize, StoreError> {
        let target = self.layer_mut(layer)?;
        target.selection = None;
        let removed = target.features.len();
        target.features.clear();
        Ok(removed)
    }

    fn insert_all(
        &mut self,
        layer: &LayerRef,
        features: Vec<Feature>,
    ) -> Result<usize, StoreError> {
        let target = self.layer_mut(layer)?;
        let inserted = features.len();
        target.features.extend(features);
        Ok(inserted)
    }

    fn refresh_extent(&mut self, layer: &LayerRef) -> Result<Option<Extent>, StoreError> {
        let target = self.layer_mut(layer)?;
        target.extent = Extent::of_geometries(target.features.iter().map(|f| &f.geometry));
        Ok(target.extent)
    }

    fn ensure_field(&mut self, layer: &LayerRef, field: &FieldDef) -> Result<bool, StoreError> {
        let target = self.layer_mut(layer)?;
        match target.fields.iter().find(|f| f.name == field.name) {
            Some(existing) if existing.kind == field.kind => Ok(false),
            Some(existing) => Err(StoreError::FieldKindConflict {
                layer: layer.clone(),
                field: field.name.clone(),
                existing: existing.kind,
                requested: field.kind,
            }),
            None => {
                target.fields.push(field.clone());
                tracing::debug!(%layer, field = %field.name, "added field");
                Ok(true)
            }
        }
    }

    fn set_field_value(
        &mut self,
        layer: &LayerRef,
        field: &str,
        value: AttrValue,
    ) -> Result<usize, StoreError> {
        let target = self.layer_mut(layer)?;
        if !target.fields.iter().any(|f| f.name == field) {
            return Err(StoreError::FieldNotFound {
                layer: layer.clone(),
                field: field.to_string(),
            });
        }
        for feature in &mut target.features {
            feature.set_attr(field, value.clone());
        }
        Ok(target.features.len())
    }

    fn set_view(
        &mut self,
        layout: &str,
        frame: &str,
        extent: Extent,
        scale_factor: f64,
    ) -> Result<ViewState, StoreError> {
        let target = self.layout_mut(layout)?;
        let slot = target
            .frames
            .iter_mut()
            .find(|f| f.name == frame)
            .ok_or_else(|| StoreError::FrameNotFound {
                layout: layout.to_string(),
                frame: frame.to_string(),
            })?;
        let (width, height) = usable_size(layout, slot)?;
        let visible = extent.fit_aspect(width / height).scaled(scale_factor);
        let view = ViewState {
            extent: visible,
            scale: visible.width() * POINTS_PER_FOOT / width,
        };
        slot.view = Some(view);
        Ok(view)
    }

    fn text_elements(&self, layout: &str) -> Result<Vec<TextElement>, StoreError> {
        let target = self
            .layout(layout)
            .ok_or_else(|| StoreError::LayoutNotFound(layout.to_string()))?;
        Ok(target.texts.iter().map(|t| t.element.clone()).collect())
    }

    fn set_text(&mut self, layout: &str, element: &str, text: &str) -> Result<(), StoreError> {
        let target = self.layout_mut(layout)?;
        let slot = target
            .texts
            .iter_mut()
            .find(|t| t.element.name == element)
            .ok_or_else(|| StoreError::TextElementNotFound {
                layout: layout.to_string(),
                element: element.to_string(),
            })?;
        slot.element.text = text.to_string();
        Ok(())
    }

    fn save(&mut self) -> Result<(), StoreError> {
        match &self.path {
            Some(path) => {
                self.save_to(path)?;
                tracing::info!(path = %path.display(), "saved project");
            }
            None => tracing::debug!("project has no backing file; nothing to save"),
        }
        Ok(())
    }
}
