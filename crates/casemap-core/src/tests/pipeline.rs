use crate::error::ResolutionReason;
use crate::tests::fakes::{FailPoint, FakeStore, RecordingExporter};
use crate::tests::fixtures;
use crate::*;
use chrono::NaiveDate;

fn params(case_id: &str, parcels: &str) -> CaseParameters {
    CaseParameters {
        metadata: CaseMetadata {
            project_name: "Smith Short Plat".into(),
            case_id: case_id.into(),
            project_manager: "J. Doe".into(),
            carto_code: "CC-7".into(),
        },
        parcels: parcels.into(),
    }
}

fn config_in(dir: &tempfile::TempDir) -> ExhibitConfig {
    ExhibitConfig {
        output_dir: dir.path().join("out"),
        ..fixtures::config()
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
}

#[test]
fn single_parcel_inside_the_growth_area() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let mut project = fixtures::case_project();
    let exporter = RecordingExporter::default();

    let report = Session::new(&mut project, &config)
        .with_fixed_today(date())
        .run_case(&params("23 119498", "R100"), &exporter)
        .unwrap();

    assert_eq!(report.case_token, "23_119498");
    assert_eq!(report.predicate, "ACCOUNT IN ('R100')");
    assert_eq!(report.matched_features, 1);
    assert!(!report.dissolved);
    assert_eq!(report.buffer_distance, BufferDistance::Urban);
    assert_eq!(report.extents.subject, Extent::new(0.0, 0.0, 100.0, 100.0));
    assert!(report.warnings.is_empty());

    let names: Vec<_> = report
        .artifacts
        .iter()
        .map(|a| a.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["23_119498_Aerial.pdf", "23_119498_Overlay.pdf"]);
    for artifact in &report.artifacts {
        assert!(artifact.path.is_file());
    }
    let layouts: Vec<_> = exporter.calls().into_iter().map(|(l, _)| l).collect();
    assert_eq!(layouts, ["Aerial Exhibit", "Overlay Exhibit"]);

    let subject = fixtures::subject_ref(&project);
    let buffer = fixtures::buffer_ref(&project);
    assert_eq!(project.feature_count(&subject).unwrap(), 1);
    assert_eq!(
        project.layer_extent(&subject),
        Some(Extent::new(0.0, 0.0, 100.0, 100.0))
    );
    let stored = fixtures::all_features(&mut project, &buffer);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].attr("BUFF_DIST"), Some(&AttrValue::Integer(500)));

    let texts = project.text_elements("Aerial Exhibit").unwrap();
    assert_eq!(texts[0].text, "Smith Short Plat");
    assert_eq!(
        texts[1].text,
        "File 23 119498 | PM J. Doe | CC-7 | March 5, 2024"
    );
    let parcels = fixtures::parcels_ref(&project);
    assert!(project.selected_features(&parcels).unwrap().is_empty());
}

#[test]
fn two_parcels_are_dissolved_into_one_subject() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let mut project = fixtures::case_project();

    let report = Session::new(&mut project, &config)
        .with_fixed_today(date())
        .run_case(
            &params("2023-000123-SHOR", "R-100, R-200"),
            &RecordingExporter::default(),
        )
        .unwrap();

    assert!(report.dissolved);
    assert_eq!(report.matched_features, 2);
    assert_eq!(report.identifiers.len(), 2);
    assert_eq!(report.extents.subject, Extent::new(0.0, 0.0, 200.0, 100.0));
    assert_eq!(
        report.artifacts[0].path.file_name().unwrap(),
        "2023_000123_SHOR_Aerial.pdf"
    );
    assert_eq!(report.buffer_distance, BufferDistance::Urban);
    let subject = fixtures::subject_ref(&project);
    let buffer = fixtures::buffer_ref(&project);
    assert_eq!(project.feature_count(&subject).unwrap(), 1);
    let stored = fixtures::all_features(&mut project, &buffer);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].attr("BUFF_DIST"), Some(&AttrValue::Integer(500)));
    assert!(
        report.artifacts[1]
            .path
            .ends_with("2023_000123_SHOR_Overlay.pdf")
    );
}

#[test]
fn multi_part_parcel_outside_the_growth_area_gets_the_rural_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let mut project = fixtures::case_project();

    let report = Session::new(&mut project, &config)
        .with_fixed_today(date())
        .run_case(&params("PL 7", "R-300"), &RecordingExporter::default())
        .unwrap();

    assert!(!report.dissolved);
    assert_eq!(report.matched_features, 2);
    assert_eq!(report.buffer_distance, BufferDistance::Rural);
    let subject = fixtures::subject_ref(&project);
    let buffer = fixtures::buffer_ref(&project);
    assert_eq!(project.feature_count(&subject).unwrap(), 2);
    assert_eq!(project.feature_count(&buffer).unwrap(), 1);
    let stored = fixtures::all_features(&mut project, &buffer);
    assert_eq!(stored[0].attr("BUFF_DIST"), Some(&AttrValue::Integer(1000)));
    // The overlay view is keyed to the buffer and contains it.
    let overlay = &report.views[1];
    assert_eq!(overlay.exhibit, Exhibit::Overlay);
    assert!(overlay.view.extent.contains(&report.extents.buffer));
}

#[test]
fn rerunning_replaces_the_stores() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let mut project = fixtures::case_project();
    {
        let mut session = Session::new(&mut project, &config).with_fixed_today(date());
        session
            .run_case(&params("A 1", "R100"), &RecordingExporter::default())
            .unwrap();
        session
            .run_case(&params("A 1", "R200"), &RecordingExporter::default())
            .unwrap();
    }
    let subject = fixtures::subject_ref(&project);
    let buffer = fixtures::buffer_ref(&project);
    assert_eq!(project.feature_count(&subject).unwrap(), 1);
    assert_eq!(project.feature_count(&buffer).unwrap(), 1);
    assert_eq!(
        project.layer_extent(&subject),
        Some(Extent::new(100.0, 0.0, 200.0, 100.0))
    );
}

#[test]
fn naming_mistakes_fail_before_any_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(&dir);
    config.overlay.frame = "Inset".into();
    let mut project = fixtures::case_project();
    let before = project.clone();

    let err = Session::new(&mut project, &config)
        .run_case(&params("A 1", "R100"), &RecordingExporter::default())
        .unwrap_err();
    assert_eq!(err.stage(), Stage::LayerResolution);
    assert!(err.to_string().contains("Inset"), "{err}");
    assert_eq!(project, before);
    assert!(!config.output_dir.exists());
}

#[test]
fn missing_target_layer_fails_before_any_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(&dir);
    config.boundary.layer = "Urban Growth Boundary".into();
    let mut project = fixtures::case_project();
    let before = project.clone();

    let err = Session::new(&mut project, &config)
        .run_case(&params("A 1", "R100"), &RecordingExporter::default())
        .unwrap_err();
    match &err {
        Error::Resolution {
            stage: Stage::LayerResolution,
            reason: ResolutionReason::NoMatchingLayer { pattern },
            ..
        } => assert_eq!(pattern, "Urban Growth Boundary"),
        other => panic!("unexpected: {other}"),
    }
    assert_eq!(project, before);
    assert!(!config.output_dir.exists());
}

#[test]
fn degenerate_frame_fails_before_any_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let mut project = fixtures::case_project();
    project.layouts[1].frames[0].width = 0.0;
    let before = project.clone();

    let err = Session::new(&mut project, &config)
        .run_case(&params("A 1", "R100"), &RecordingExporter::default())
        .unwrap_err();
    assert!(
        matches!(
            err,
            Error::Resolution {
                reason: ResolutionReason::DegenerateFrame { .. },
                ..
            }
        ),
        "{err}"
    );
    assert_eq!(project, before);
}

#[test]
fn case_ids_that_leave_the_output_directory_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    for case_id in ["../escaped", "2023/001"] {
        let mut store = FakeStore::new(fixtures::case_project());
        let exporter = RecordingExporter::default();
        let err = Session::new(&mut store, &config)
            .run_case(&params(case_id, "R100"), &exporter)
            .unwrap_err();
        assert!(
            matches!(err, Error::InvalidInput { stage: Stage::Input, .. }),
            "{case_id}: {err}"
        );
        assert_eq!(store.insert_calls(), 0);
        assert_eq!(store.saves(), 0);
        assert!(exporter.calls().is_empty());
    }
    assert!(!dir.path().join("escaped_Aerial.pdf").exists());
}

#[test]
fn unmatched_identifiers_leave_the_stores_alone() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let mut project = fixtures::case_project();
    let before = project.clone();

    let err = Session::new(&mut project, &config)
        .run_case(&params("A 1", "R999"), &RecordingExporter::default())
        .unwrap_err();
    assert_eq!(err.stage(), Stage::SubjectResolution);
    assert_eq!(project, before);
}

#[test]
fn blank_input_never_touches_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let mut store = FakeStore::new(fixtures::case_project());
    let err = Session::new(&mut store, &config)
        .run_case(&params("A 1", " ,, "), &RecordingExporter::default())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }));
    assert_eq!(store.insert_calls(), 0);
}

#[test]
fn failed_second_export_names_the_overlay() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let mut project = fixtures::case_project();
    let exporter = RecordingExporter::failing_on_call(2);

    let err = Session::new(&mut project, &config)
        .with_fixed_today(date())
        .run_case(&params("23 119498", "R100"), &exporter)
        .unwrap_err();
    match &err {
        Error::Export { exhibit, layout, .. } => {
            assert_eq!(*exhibit, Exhibit::Overlay);
            assert_eq!(layout, "Overlay Exhibit");
        }
        other => panic!("unexpected: {other}"),
    }
    assert!(err.to_string().contains("overlay exhibit"), "{err}");
    assert!(config.output_dir.join("23_119498_Aerial.pdf").is_file());
    assert!(!config.output_dir.join("23_119498_Overlay.pdf").exists());
}

#[test]
fn save_failure_stops_before_export() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let mut store = FakeStore::new(fixtures::case_project()).failing(FailPoint::Save);
    let exporter = RecordingExporter::default();

    let err = Session::new(&mut store, &config)
        .with_fixed_today(date())
        .run_case(&params("A 1", "R100"), &exporter)
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Save);
    assert!(exporter.calls().is_empty());
}

#[test]
fn save_can_be_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let mut store = FakeStore::new(fixtures::case_project());
    let report = Session::new(&mut store, &config)
        .with_save(false)
        .with_fixed_today(date())
        .run_case(&params("A 1", "R100"), &RecordingExporter::default())
        .unwrap();
    assert!(!report.saved);
    assert_eq!(store.saves(), 0);
}

#[test]
fn zero_operation_budget_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExhibitConfig {
        operation_timeout_ms: Some(0),
        ..config_in(&dir)
    };
    let mut project = fixtures::case_project();
    let before = project.clone();

    let err = Session::new(&mut project, &config)
        .run_case(&params("A 1", "R100"), &RecordingExporter::default())
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }), "{err}");
    assert_eq!(project, before);
}

#[test]
fn ambiguous_layer_patterns_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(&dir);
    config.parcels.layer = "Tax*".into();
    let mut project = fixtures::case_project();
    project.maps[0].layers.push(crate::project::Layer::new("Tax Lots"));

    let mut session = Session::new(&mut project, &config).with_fixed_today(date());
    let report = session
        .run_case(&params("A 1", "R100"), &RecordingExporter::default())
        .unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(session.warnings().len(), 1);
    assert!(report.warnings[0].to_string().contains("using `Tax Parcels`"));
}
