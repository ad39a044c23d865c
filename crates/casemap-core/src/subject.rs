use crate::document::{DocumentStore, LayerRef, Selection};
use crate::error::{Error, ResolutionReason, Result, Stage};
use crate::feature::Feature;
use crate::query::AttributeQuery;
use crate::selection::SelectionGuard;

/// Transient feature set produced by one stage and consumed by the next.
///
/// Handing it to [`crate::sync::replace_contents`] moves it into the store; it never outlives
/// the run that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScratchSet {
    features: Vec<Feature>,
    matched: usize,
    dissolved: bool,
}

impl ScratchSet {
    pub fn single(feature: Feature) -> Self {
        Self {
            features: vec![feature],
            matched: 1,
            dissolved: false,
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Number of source features the set was built from.
    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn dissolved(&self) -> bool {
        self.dissolved
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }
}

/// Selects the parcels matching `query` and turns them into the subject geometry.
///
/// Dissolve runs only when more than one identifier was supplied. A single identifier that
/// matches several polygon parts passes through undissolved. Zero matches is a resolution
/// failure and nothing has been mutated yet.
pub fn resolve_subject<D: DocumentStore + ?Sized>(
    store: &mut D,
    parcels: &LayerRef,
    query: &AttributeQuery,
    identifier_count: usize,
) -> Result<ScratchSet> {
    let matched = {
        let guard = SelectionGuard::acquire(
            &mut *store,
            parcels,
            &Selection::Attribute(query.clone()),
        )
        .map_err(|source| Error::store(Stage::SubjectResolution, parcels, source))?;
        guard
            .features()
            .map_err(|source| Error::store(Stage::SubjectResolution, parcels, source))?
    };
    tracing::info!(
        layer = %parcels,
        matched = matched.len(),
        identifiers = identifier_count,
        "selected subject parcels"
    );

    if matched.is_empty() {
        return Err(Error::resolution(
            Stage::SubjectResolution,
            parcels,
            ResolutionReason::NoMatchingFeatures {
                predicate: query.predicate(),
            },
        ));
    }

    let count = matched.len();
    if identifier_count > 1 {
        let merged = store
            .dissolve(&matched)
            .map_err(|source| Error::store(Stage::SubjectResolution, parcels, source))?;
        tracing::info!(parts = count, "dissolved subject parcels");
        return Ok(ScratchSet {
            features: vec![merged],
            matched: count,
            dissolved: true,
        });
    }

    Ok(ScratchSet {
        features: matched,
        matched: count,
        dissolved: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::sanitize_identifiers;
    use crate::tests::fakes::FakeStore;
    use crate::tests::fixtures;

    fn query(raw: &str) -> (AttributeQuery, usize) {
        let ids = sanitize_identifiers(raw);
        (AttributeQuery::build(fixtures::ID_FIELD, &ids), ids.len())
    }

    #[test]
    fn two_identifiers_dissolve_into_one_feature() {
        let mut project = fixtures::case_project();
        let parcels = fixtures::parcels_ref(&project);
        let (q, n) = query("R-100, R-200");
        let scratch = resolve_subject(&mut project, &parcels, &q, n).unwrap();
        assert!(scratch.dissolved());
        assert_eq!(scratch.matched(), 2);
        assert_eq!(scratch.len(), 1);
        let extent = scratch.features()[0].extent().unwrap();
        assert_eq!(extent, crate::Extent::new(0.0, 0.0, 200.0, 100.0));
    }

    #[test]
    fn single_identifier_with_several_parts_is_not_dissolved() {
        let mut store = FakeStore::new(fixtures::case_project());
        let parcels = fixtures::parcels_ref(store.project());
        // R-300 is stored as two separate polygon features.
        let (q, n) = query("R-300");
        let scratch = resolve_subject(&mut store, &parcels, &q, n).unwrap();
        assert!(!scratch.dissolved());
        assert_eq!(scratch.len(), 2);
        assert_eq!(store.dissolve_calls(), 0);
    }

    #[test]
    fn duplicate_identifiers_still_dissolve_once() {
        let mut store = FakeStore::new(fixtures::case_project());
        let parcels = fixtures::parcels_ref(store.project());
        let (q, n) = query("R100 R100");
        let scratch = resolve_subject(&mut store, &parcels, &q, n).unwrap();
        assert!(scratch.dissolved());
        assert_eq!(scratch.len(), 1);
        assert_eq!(store.dissolve_calls(), 1);
    }

    #[test]
    fn zero_matches_is_a_resolution_failure() {
        let mut project = fixtures::case_project();
        let parcels = fixtures::parcels_ref(&project);
        let (q, n) = query("NOPE");
        let err = resolve_subject(&mut project, &parcels, &q, n).unwrap_err();
        assert!(matches!(
            err,
            Error::Resolution {
                stage: Stage::SubjectResolution,
                reason: ResolutionReason::NoMatchingFeatures { .. },
                ..
            }
        ));
        assert!(err.to_string().contains("ACCOUNT IN ('NOPE')"), "{err}");
    }

    #[test]
    fn selection_never_leaks_past_the_stage() {
        let mut project = fixtures::case_project();
        let parcels = fixtures::parcels_ref(&project);
        for raw in ["R100", "NOPE"] {
            let (q, n) = query(raw);
            let _ = resolve_subject(&mut project, &parcels, &q, n);
            assert!(project.selected_features(&parcels).unwrap().is_empty());
        }
    }
}
