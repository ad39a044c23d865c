//! Per-operation time budget around the data-size-dependent store primitives.
//!
//! [`TimedStore`] wraps a store and turns any select, dissolve or buffer call that runs past the
//! budget into [`StoreError::Timeout`], which stops the pipeline at the next stage boundary.
//!
//! The check is post hoc: elapsed time is measured once the call returns. A slow operation is
//! neither interrupted nor cancelled; it runs to completion and its result is then discarded.
//! Only the work after it is skipped.

use crate::document::{DocumentStore, LayerRef, Selection, StoreError, TextElement, ViewState};
use crate::feature::{AttrValue, Feature, FieldDef};
use crate::geom::Extent;
use std::time::{Duration, Instant};

/// Store decorator that fails over-budget operations after they finish.
pub struct TimedStore<'a, D: DocumentStore + ?Sized> {
    inner: &'a mut D,
    limit: Duration,
}

impl<'a, D: DocumentStore + ?Sized> TimedStore<'a, D> {
    pub fn new(inner: &'a mut D, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    fn check<T>(
        limit: Duration,
        operation: &'static str,
        f: impl FnOnce() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let started = Instant::now();
        let out = f()?;
        let elapsed = started.elapsed();
        if elapsed > limit {
            tracing::error!(operation, ?elapsed, ?limit, "store operation over budget");
            return Err(StoreError::Timeout {
                operation,
                limit,
                elapsed,
            });
        }
        Ok(out)
    }
}

impl<D: DocumentStore + ?Sized> DocumentStore for TimedStore<'_, D> {
    fn map_names(&self) -> Vec<String> {
        self.inner.map_names()
    }

    fn layout_names(&self) -> Vec<String> {
        self.inner.layout_names()
    }

    fn map_frame_names(&self, layout: &str) -> Result<Vec<String>, StoreError> {
        self.inner.map_frame_names(layout)
    }

    fn frame_size(&self, layout: &str, frame: &str) -> Result<(f64, f64), StoreError> {
        self.inner.frame_size(layout, frame)
    }

    fn find_layers(&self, map_index: usize, pattern: &str) -> Result<Vec<LayerRef>, StoreError> {
        self.inner.find_layers(map_index, pattern)
    }

    fn select(&mut self, layer: &LayerRef, selection: &Selection) -> Result<usize, StoreError> {
        let inner = &mut *self.inner;
        Self::check(self.limit, "select", || inner.select(layer, selection))
    }

    fn selected_features(&self, layer: &LayerRef) -> Result<Vec<Feature>, StoreError> {
        self.inner.selected_features(layer)
    }

    fn selection_extent(&self, layer: &LayerRef) -> Result<Option<Extent>, StoreError> {
        self.inner.selection_extent(layer)
    }

    fn clear_selection(&mut self, layer: &LayerRef) {
        self.inner.clear_selection(layer);
    }

    fn feature_count(&self, layer: &LayerRef) -> Result<usize, StoreError> {
        self.inner.feature_count(layer)
    }

    fn dissolve(&self, features: &[Feature]) -> Result<Feature, StoreError> {
        Self::check(self.limit, "dissolve", || self.inner.dissolve(features))
    }

    fn buffer(&self, features: &[Feature], distance: f64) -> Result<Feature, StoreError> {
        Self::check(self.limit, "buffer", || self.inner.buffer(features, distance))
    }

    fn delete_all(&mut self, layer: &LayerRef) -> Result<usize, StoreError> {
        self.inner.delete_all(layer)
    }

    fn insert_all(
        &mut self,
        layer: &LayerRef,
        features: Vec<Feature>,
    ) -> Result<usize, StoreError> {
        self.inner.insert_all(layer, features)
    }

    fn refresh_extent(&mut self, layer: &LayerRef) -> Result<Option<Extent>, StoreError> {
        self.inner.refresh_extent(layer)
    }

    fn ensure_field(&mut self, layer: &LayerRef, field: &FieldDef) -> Result<bool, StoreError> {
        self.inner.ensure_field(layer, field)
    }

    fn set_field_value(
        &mut self,
        layer: &LayerRef,
        field: &str,
        value: AttrValue,
    ) -> Result<usize, StoreError> {
        self.inner.set_field_value(layer, field, value)
    }

    fn set_view(
        &mut self,
        layout: &str,
        frame: &str,
        extent: Extent,
        scale_factor: f64,
    ) -> Result<ViewState, StoreError> {
        self.inner.set_view(layout, frame, extent, scale_factor)
    }

    fn text_elements(&self, layout: &str) -> Result<Vec<TextElement>, StoreError> {
        self.inner.text_elements(layout)
    }

    fn set_text(&mut self, layout: &str, element: &str, text: &str) -> Result<(), StoreError> {
        self.inner.set_text(layout, element, text)
    }

    fn save(&mut self) -> Result<(), StoreError> {
        self.inner.save()
    }
}
