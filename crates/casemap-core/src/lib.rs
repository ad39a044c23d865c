#![forbid(unsafe_code)]

//! Headless core for land-use case map exhibits.
//!
//! Given a set of parcel (tax account) identifiers and case metadata, the pipeline:
//! - sanitizes the identifiers and builds an attribute predicate
//! - resolves the matching parcels to a single subject geometry (dissolving multi-parcel cases)
//! - replaces the subject-property store with that geometry
//! - sizes the notification buffer from urban growth area containment (500 or 1000 ft)
//! - generates and stores the buffer polygon, tagged with its distance
//! - frames the aerial and overlay views and names the two PDF exhibits
//!
//! The document store is an external collaborator ([`DocumentStore`]); [`Project`] is the
//! in-memory, JSON-backed implementation used by the CLI and the tests.

pub mod budget;
pub mod buffer;
pub mod case;
pub mod config;
pub mod document;
pub mod error;
pub mod exhibit;
pub mod feature;
pub mod framing;
pub mod geom;
pub mod layers;
pub mod naming;
pub mod pipeline;
pub mod policy;
pub mod project;
pub mod query;
pub mod sanitize;
pub mod selection;
pub mod stamp;
pub mod subject;
pub mod sync;

pub use case::{CaseMetadata, CaseParameters};
pub use config::ExhibitConfig;
pub use document::{DocumentStore, LayerRef, LayoutExporter, Selection, StoreError};
pub use error::{Error, Result, Stage, Warning};
pub use exhibit::Exhibit;
pub use feature::{AttrValue, Feature, FieldDef, FieldKind};
pub use geom::Extent;
pub use pipeline::{CaseReport, Session};
pub use policy::BufferDistance;
pub use project::Project;
pub use query::AttributeQuery;
pub use sanitize::{ParcelId, sanitize_identifiers};

#[cfg(test)]
mod tests;
