use crate::document::{DocumentStore, LayerRef, Selection, StoreError};
use crate::feature::Feature;
use crate::geom::Extent;

/// Scoped selection on one layer.
///
/// The selection is made in [`SelectionGuard::acquire`] and cleared when the guard drops, on
/// success and on every error path. A selection left behind on a shared layer would leak into
/// the next spatial query against it.
pub struct SelectionGuard<'s, D: DocumentStore + ?Sized> {
    store: &'s mut D,
    layer: LayerRef,
    count: usize,
}

impl<'s, D: DocumentStore + ?Sized> SelectionGuard<'s, D> {
    pub fn acquire(
        store: &'s mut D,
        layer: &LayerRef,
        selection: &Selection,
    ) -> Result<Self, StoreError> {
        match store.select(layer, selection) {
            Ok(count) => {
                tracing::trace!(%layer, count, "selection acquired");
                Ok(Self {
                    store,
                    layer: layer.clone(),
                    count,
                })
            }
            Err(err) => {
                // A failed select may still have left a partial selection behind.
                store.clear_selection(layer);
                Err(err)
            }
        }
    }

    pub fn layer(&self) -> &LayerRef {
        &self.layer
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn features(&self) -> Result<Vec<Feature>, StoreError> {
        self.store.selected_features(&self.layer)
    }

    pub fn extent(&self) -> Result<Option<Extent>, StoreError> {
        self.store.selection_extent(&self.layer)
    }
}

impl<D: DocumentStore + ?Sized> Drop for SelectionGuard<'_, D> {
    fn drop(&mut self) {
        self.store.clear_selection(&self.layer);
        tracing::trace!(layer = %self.layer, "selection cleared");
    }
}
