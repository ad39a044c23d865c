use crate::document::{DocumentStore, LayerRef};
use crate::error::{Error, Result, Stage, SyncPhase};
use crate::geom::Extent;
use crate::subject::ScratchSet;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SyncOutcome {
    pub removed: usize,
    pub inserted: usize,
    pub extent: Option<Extent>,
}

/// Replaces every feature of `target` with the scratch set: delete all, then insert all.
///
/// A failed delete stops before inserting. A failed insert leaves the store empty and says so.
/// After a successful insert the store's cached extent is refreshed. The scratch set is consumed.
pub fn replace_contents<D: DocumentStore + ?Sized>(
    store: &mut D,
    target: &LayerRef,
    scratch: ScratchSet,
    stage: Stage,
) -> Result<SyncOutcome> {
    let removed = store.delete_all(target).map_err(|source| Error::StoreSync {
        stage,
        resource: target.to_string(),
        phase: SyncPhase::Delete,
        source,
    })?;

    let inserted = match store.insert_all(target, scratch.into_features()) {
        Ok(n) => n,
        Err(source) => {
            tracing::error!(
                %target,
                removed,
                "insert failed after delete; store left empty"
            );
            return Err(Error::StoreSync {
                stage,
                resource: target.to_string(),
                phase: SyncPhase::Insert,
                source,
            });
        }
    };

    let extent = store.refresh_extent(target).map_err(|source| Error::StoreSync {
        stage,
        resource: target.to_string(),
        phase: SyncPhase::RefreshExtent,
        source,
    })?;

    tracing::info!(%target, removed, inserted, "replaced store contents");
    Ok(SyncOutcome {
        removed,
        inserted,
        extent,
    })
}
