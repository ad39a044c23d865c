use crate::document::{DocumentStore, LayerRef, Selection};
use crate::error::{Error, Result, Stage};
use crate::selection::SelectionGuard;
use serde::{Serialize, Serializer};
use std::fmt;

/// Regulatory notification buffer distance, in linear feet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferDistance {
    /// Subject centroid inside the urban growth area: 500 ft.
    Urban,
    /// Subject centroid outside every urban growth area polygon: 1000 ft.
    Rural,
}

impl BufferDistance {
    pub const fn feet(self) -> u32 {
        match self {
            BufferDistance::Urban => 500,
            BufferDistance::Rural => 1000,
        }
    }

    /// Policy decision from the number of subject features centred inside the boundary.
    pub const fn from_inside_count(count: usize) -> Self {
        if count > 0 {
            BufferDistance::Urban
        } else {
            BufferDistance::Rural
        }
    }
}

impl fmt::Display for BufferDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ft", self.feet())
    }
}

impl Serialize for BufferDistance {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.feet())
    }
}

/// Sizes the buffer by testing whether any subject feature has its centroid in the boundary.
///
/// Centroid containment, not intersection: a parcel straddling the boundary with its centroid
/// outside counts as outside. Only selection state is touched, and it is cleared on return.
pub fn buffer_distance<D: DocumentStore + ?Sized>(
    store: &mut D,
    subject: &LayerRef,
    boundary: &LayerRef,
) -> Result<BufferDistance> {
    let inside = {
        let guard = SelectionGuard::acquire(
            &mut *store,
            subject,
            &Selection::CentroidWithin(boundary.clone()),
        )
        .map_err(|source| Error::store(Stage::BufferPolicy, subject, source))?;
        guard.count()
    };
    let distance = BufferDistance::from_inside_count(inside);
    tracing::info!(%subject, %boundary, inside, %distance, "buffer distance decided");
    Ok(distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use crate::subject::ScratchSet;
    use crate::sync::replace_contents;
    use crate::tests::fixtures;

    fn store_subject(project: &mut crate::Project, feature: Feature) -> LayerRef {
        let subject = fixtures::subject_ref(project);
        replace_contents(
            project,
            &subject,
            ScratchSet::single(feature),
            Stage::SubjectSync,
        )
        .unwrap();
        subject
    }

    #[test]
    fn distances_are_500_or_1000() {
        assert_eq!(BufferDistance::from_inside_count(0).feet(), 1000);
        assert_eq!(BufferDistance::from_inside_count(1).feet(), 500);
        assert_eq!(BufferDistance::from_inside_count(7).feet(), 500);
        assert_eq!(serde_json::to_string(&BufferDistance::Urban).unwrap(), "500");
    }

    #[test]
    fn centroid_inside_boundary_is_urban() {
        let mut project = fixtures::case_project();
        let subject = store_subject(
            &mut project,
            Feature::from_polygon(fixtures::square(0.0, 0.0, 100.0)),
        );
        let boundary = fixtures::boundary_ref(&project);
        assert_eq!(
            buffer_distance(&mut project, &subject, &boundary).unwrap(),
            BufferDistance::Urban
        );
    }

    #[test]
    fn centroid_outside_boundary_is_rural() {
        let mut project = fixtures::case_project();
        let subject = store_subject(
            &mut project,
            Feature::from_polygon(fixtures::square(5000.0, 0.0, 100.0)),
        );
        let boundary = fixtures::boundary_ref(&project);
        assert_eq!(
            buffer_distance(&mut project, &subject, &boundary).unwrap(),
            BufferDistance::Rural
        );
    }

    #[test]
    fn straddling_parcel_follows_its_centroid() {
        // The boundary ends at x = 1000. Most of this parcel's area is inside, but the long thin
        // tail pushes its centroid outside.
        use geo::polygon;
        let mut project = fixtures::case_project();
        let parcel = geo::polygon![
            (x: 600.0, y: 0.0),
            (x: 1000.0, y: 0.0),
            (x: 3000.0, y: 0.0),
            (x: 3000.0, y: 10.0),
            (x: 1000.0, y: 10.0),
            (x: 1000.0, y: 100.0),
            (x: 600.0, y: 100.0),
        ];
        let subject = store_subject(&mut project, Feature::from_polygon(parcel));
        let boundary = fixtures::boundary_ref(&project);
        assert_eq!(
            buffer_distance(&mut project, &subject, &boundary).unwrap(),
            BufferDistance::Rural
        );
    }

    #[test]
    fn policy_is_repeatable_and_leaves_no_selection() {
        let mut project = fixtures::case_project();
        let subject = store_subject(
            &mut project,
            Feature::from_polygon(fixtures::square(0.0, 0.0, 100.0)),
        );
        let boundary = fixtures::boundary_ref(&project);
        let first = buffer_distance(&mut project, &subject, &boundary).unwrap();
        for _ in 0..3 {
            assert_eq!(
                buffer_distance(&mut project, &subject, &boundary).unwrap(),
                first
            );
        }
        assert!(project.selected_features(&subject).unwrap().is_empty());
        assert_eq!(project.feature_count(&subject).unwrap(), 1);
    }
}
