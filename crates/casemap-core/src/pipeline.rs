//! One case run, from raw parameters to two exported exhibits.
//!
//! Every layer, layout and frame is resolved before anything is mutated, so a naming mistake in
//! the document fails the run with the stores untouched. After that the stages run in a fixed
//! order and the first failure stops the run; nothing is rolled back.

use crate::budget::TimedStore;
use crate::buffer::generate_buffer;
use crate::case::CaseParameters;
use crate::config::{ExhibitConfig, LayerConfig};
use crate::document::{DocumentStore, LayerRef, LayoutExporter, StoreError};
use crate::error::{Error, Result, Stage, Warning};
use crate::exhibit::Exhibit;
use crate::framing::{Extents, FramedView, compute_extents, frame_view};
use crate::layers::{Resolved, resolve_frame, resolve_layer};
use crate::naming::ExportNames;
use crate::policy::{BufferDistance, buffer_distance};
use crate::query::AttributeQuery;
use crate::sanitize::ParcelId;
use crate::stamp::stamp_layout;
use crate::subject::resolve_subject;
use crate::sync::replace_contents;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;

/// Layers a run works on, resolved up front.
#[derive(Debug, Clone)]
struct Targets {
    parcels: LayerRef,
    boundary: LayerRef,
    subject: LayerRef,
    buffer: LayerRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub exhibit: Exhibit,
    pub path: PathBuf,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseReport {
    pub case_token: String,
    pub identifiers: Vec<ParcelId>,
    pub predicate: String,
    pub matched_features: usize,
    pub dissolved: bool,
    pub buffer_distance: BufferDistance,
    pub extents: Extents,
    pub views: Vec<FramedView>,
    pub saved: bool,
    pub artifacts: Vec<Artifact>,
    pub warnings: Vec<Warning>,
}

/// Outcome of the mutating stages, before save and export.
struct Staged {
    matched: usize,
    dissolved: bool,
    distance: BufferDistance,
    extents: Extents,
    views: Vec<FramedView>,
}

/// Explicit context for case runs against one open document.
///
/// The session holds the only mutable borrow of the store, so runs against the same document
/// are serialized by construction.
pub struct Session<'a, D: DocumentStore + ?Sized> {
    store: &'a mut D,
    config: &'a ExhibitConfig,
    today: Option<NaiveDate>,
    save: bool,
    warnings: Vec<Warning>,
}

impl<'a, D: DocumentStore + ?Sized> Session<'a, D> {
    pub fn new(store: &'a mut D, config: &'a ExhibitConfig) -> Self {
        Self {
            store,
            config,
            today: None,
            save: true,
            warnings: Vec::new(),
        }
    }

    /// Stamps layouts with `date` instead of the local date.
    pub fn with_fixed_today(mut self, date: NaiveDate) -> Self {
        self.today = Some(date);
        self
    }

    /// Whether the document is saved after a successful run. On by default.
    pub fn with_save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }

    /// Every warning raised by runs in this session.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn store(&self) -> &D {
        &*self.store
    }

    pub fn config(&self) -> &ExhibitConfig {
        self.config
    }

    /// Runs one case end to end and exports the aerial and overlay exhibits.
    pub fn run_case<E>(&mut self, params: &CaseParameters, exporter: &E) -> Result<CaseReport>
    where
        E: LayoutExporter<D> + ?Sized,
    {
        let identifiers = params.identifiers()?;
        let names = ExportNames::for_case(&params.metadata.case_id);
        let _span = tracing::info_span!("case", case = %names.token).entered();

        let query = AttributeQuery::build(&self.config.id_field, &identifiers);
        let mut warnings = Vec::new();
        let targets = self.resolve_targets(&mut warnings)?;
        self.warnings.extend(warnings.iter().cloned());

        let date = self
            .today
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let staged = match self.config.operation_timeout() {
            Some(limit) => {
                let mut timed = TimedStore::new(&mut *self.store, limit);
                run_stages(
                    &mut timed,
                    self.config,
                    &targets,
                    &query,
                    identifiers.len(),
                    params,
                    date,
                )?
            }
            None => run_stages(
                &mut *self.store,
                self.config,
                &targets,
                &query,
                identifiers.len(),
                params,
                date,
            )?,
        };

        if self.save {
            self.store
                .save()
                .map_err(|source| Error::store(Stage::Save, "document", source))?;
        }

        let artifacts = self.export_all(&names, &staged.views, exporter)?;

        tracing::info!(
            matched = staged.matched,
            dissolved = staged.dissolved,
            distance = %staged.distance,
            artifacts = artifacts.len(),
            "case complete"
        );
        Ok(CaseReport {
            case_token: names.token,
            identifiers,
            predicate: query.predicate(),
            matched_features: staged.matched,
            dissolved: staged.dissolved,
            buffer_distance: staged.distance,
            extents: staged.extents,
            views: staged.views,
            saved: self.save,
            artifacts,
            warnings,
        })
    }

    fn resolve_targets(&self, warnings: &mut Vec<Warning>) -> Result<Targets> {
        let mut layer = |config: &LayerConfig| -> Result<LayerRef> {
            let Resolved {
                value,
                warnings: found,
            } = resolve_layer(&*self.store, &config.map, &config.layer)?;
            warnings.extend(found);
            Ok(value)
        };
        let targets = Targets {
            parcels: layer(&self.config.parcels)?,
            boundary: layer(&self.config.boundary)?,
            subject: layer(&self.config.subject_store)?,
            buffer: layer(&self.config.buffer_store)?,
        };
        for view in [&self.config.aerial, &self.config.overlay] {
            let Resolved { warnings: found, .. } =
                resolve_frame(&*self.store, &view.layout, &view.frame)?;
            warnings.extend(found);
        }
        Ok(targets)
    }

    fn export_all<E>(
        &self,
        names: &ExportNames,
        views: &[FramedView],
        exporter: &E,
    ) -> Result<Vec<Artifact>>
    where
        E: LayoutExporter<D> + ?Sized,
    {
        let dir = &self.config.output_dir;
        std::fs::create_dir_all(dir).map_err(|err| {
            Error::store(
                Stage::Export,
                format_args!("output directory {}", dir.display()),
                StoreError::Io(err),
            )
        })?;

        let mut artifacts = Vec::with_capacity(views.len());
        for view in views {
            let path = names.path_in(dir, view.exhibit);
            exporter
                .export_layout(&*self.store, &view.layout, &path, self.config.resolution)
                .map_err(|source| Error::Export {
                    stage: Stage::Export,
                    exhibit: view.exhibit,
                    layout: view.layout.clone(),
                    path: path.clone(),
                    source,
                })?;
            tracing::info!(exhibit = %view.exhibit, path = %path.display(), "exported exhibit");
            artifacts.push(Artifact {
                exhibit: view.exhibit,
                path,
            });
        }
        Ok(artifacts)
    }
}

fn run_stages<S: DocumentStore + ?Sized>(
    store: &mut S,
    config: &ExhibitConfig,
    targets: &Targets,
    query: &AttributeQuery,
    identifier_count: usize,
    params: &CaseParameters,
    date: NaiveDate,
) -> Result<Staged> {
    let scratch = resolve_subject(store, &targets.parcels, query, identifier_count)?;
    let matched = scratch.matched();
    let dissolved = scratch.dissolved();
    replace_contents(store, &targets.subject, scratch, Stage::SubjectSync)?;

    let distance = buffer_distance(store, &targets.subject, &targets.boundary)?;
    generate_buffer(
        store,
        &targets.subject,
        &targets.buffer,
        distance,
        &config.distance_field,
    )?;

    let extents = compute_extents(store, &targets.subject, &targets.buffer)?;
    let mut views = Vec::with_capacity(Exhibit::ALL.len());
    for exhibit in Exhibit::ALL {
        let view = match exhibit {
            Exhibit::Aerial => &config.aerial,
            Exhibit::Overlay => &config.overlay,
        };
        views.push(frame_view(store, exhibit, view, &extents)?);
        stamp_layout(store, &view.layout, &params.metadata, date)?;
    }

    Ok(Staged {
        matched,
        dissolved,
        distance,
        extents,
        views,
    })
}
