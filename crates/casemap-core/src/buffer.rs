use crate::document::{DocumentStore, LayerRef, Selection};
use crate::error::{Error, ResolutionReason, Result, Stage, SyncPhase};
use crate::feature::{AttrValue, FieldDef, FieldKind};
use crate::policy::BufferDistance;
use crate::selection::SelectionGuard;
use crate::subject::ScratchSet;
use crate::sync::{SyncOutcome, replace_contents};

/// Field on the buffer store holding the distance used, when configuration does not name one.
pub const DEFAULT_DISTANCE_FIELD: &str = "BUFF_DIST";

/// Builds one dissolved buffer polygon around the stored subject and replaces the buffer
/// store with it, tagged with the distance in `distance_field`.
///
/// The distance field is added to the buffer store schema first, so a schema failure stops the
/// stage before the store is emptied.
pub fn generate_buffer<D: DocumentStore + ?Sized>(
    store: &mut D,
    subject: &LayerRef,
    target: &LayerRef,
    distance: BufferDistance,
    distance_field: &str,
) -> Result<SyncOutcome> {
    let subject_features = {
        let guard = SelectionGuard::acquire(&mut *store, subject, &Selection::All)
            .map_err(|source| Error::store(Stage::BufferGeneration, subject, source))?;
        guard
            .features()
            .map_err(|source| Error::store(Stage::BufferGeneration, subject, source))?
    };
    if subject_features.is_empty() {
        return Err(Error::resolution(
            Stage::BufferGeneration,
            subject,
            ResolutionReason::EmptyStore,
        ));
    }

    let feet = distance.feet();
    let buffered = store
        .buffer(&subject_features, f64::from(feet))
        .map_err(|source| Error::store(Stage::BufferGeneration, subject, source))?;
    tracing::info!(%subject, parts = subject_features.len(), %distance, "buffered subject");

    let field = FieldDef::new(distance_field, FieldKind::Integer);
    let added = store
        .ensure_field(target, &field)
        .map_err(|source| Error::SchemaEvolution {
            stage: Stage::BufferGeneration,
            resource: target.to_string(),
            field: distance_field.to_string(),
            source,
        })?;
    if added {
        tracing::info!(%target, field = distance_field, "added distance field");
    }

    let outcome = replace_contents(store, target, ScratchSet::single(buffered), Stage::BufferSync)?;

    store
        .set_field_value(target, distance_field, AttrValue::Integer(i64::from(feet)))
        .map_err(|source| Error::StoreSync {
            stage: Stage::BufferSync,
            resource: target.to_string(),
            phase: SyncPhase::Tag,
            source,
        })?;

    Ok(outcome)
}
