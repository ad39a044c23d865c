use crate::config::ViewConfig;
use crate::document::{DocumentStore, LayerRef, Selection, ViewState};
use crate::error::{Error, ResolutionReason, Result, Stage};
use crate::exhibit::Exhibit;
use crate::geom::Extent;
use crate::selection::SelectionGuard;
use serde::Serialize;

/// Subject and buffer rectangles of one run. Neither is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extents {
    pub subject: Extent,
    pub buffer: Extent,
}

impl Extents {
    pub fn for_exhibit(&self, exhibit: Exhibit) -> Extent {
        match exhibit {
            Exhibit::Aerial => self.subject,
            Exhibit::Overlay => self.buffer,
        }
    }
}

/// Bounding rectangle of everything currently in `store_layer`.
///
/// An empty store here means an earlier stage broke its contract, so it is fatal.
pub fn store_extent<D: DocumentStore + ?Sized>(
    store: &mut D,
    store_layer: &LayerRef,
) -> Result<Extent> {
    let guard = SelectionGuard::acquire(store, store_layer, &Selection::All)
        .map_err(|source| Error::store(Stage::Framing, store_layer, source))?;
    let extent = guard
        .extent()
        .map_err(|source| Error::store(Stage::Framing, store_layer, source))?;
    extent.ok_or_else(|| {
        Error::resolution(Stage::Framing, store_layer, ResolutionReason::EmptyStore)
    })
}

pub fn compute_extents<D: DocumentStore + ?Sized>(
    store: &mut D,
    subject: &LayerRef,
    buffer: &LayerRef,
) -> Result<Extents> {
    let extents = Extents {
        subject: store_extent(store, subject)?,
        buffer: store_extent(store, buffer)?,
    };
    tracing::debug!(subject = ?extents.subject, buffer = ?extents.buffer, "computed extents");
    Ok(extents)
}

/// A framed view as applied to the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FramedView {
    pub exhibit: Exhibit,
    pub layout: String,
    pub frame: String,
    /// Rectangle the view was keyed to.
    pub target: Extent,
    pub scale_factor: f64,
    pub view: ViewState,
}

/// Keys `exhibit`'s view to its rectangle and widens it by the exhibit's fixed factor.
pub fn frame_view<D: DocumentStore + ?Sized>(
    store: &mut D,
    exhibit: Exhibit,
    view: &ViewConfig,
    extents: &Extents,
) -> Result<FramedView> {
    let target = extents.for_exhibit(exhibit);
    let scale_factor = exhibit.scale_factor();
    let state = store
        .set_view(&view.layout, &view.frame, target, scale_factor)
        .map_err(|source| {
            Error::store(
                Stage::Framing,
                format_args!("map frame `{}` in layout `{}`", view.frame, view.layout),
                source,
            )
        })?;
    tracing::info!(
        %exhibit,
        layout = %view.layout,
        frame = %view.frame,
        scale = state.scale,
        "framed view"
    );
    Ok(FramedView {
        exhibit,
        layout: view.layout.clone(),
        frame: view.frame.clone(),
        target,
        scale_factor,
        view: state,
    })
}
