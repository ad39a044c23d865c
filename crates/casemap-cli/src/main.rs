use casemap::config::ConfigError;
use casemap::render::pdf::PdfExporter;
use casemap::{
    AttributeQuery, CaseMetadata, CaseParameters, DocumentStore, ExhibitConfig, Project, Session,
    StoreError, sanitize_identifiers,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Config(ConfigError),
    Store(StoreError),
    Case(casemap::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Config(err) => write!(f, "{err}"),
            CliError::Store(err) => write!(f, "project error: {err}"),
            CliError::Case(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<casemap::Error> for CliError {
    fn from(value: casemap::Error) -> Self {
        Self::Case(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Run,
    Inspect,
    Query,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    project: Option<PathBuf>,
    config: Option<PathBuf>,
    metadata: CaseMetadata,
    parcels: Option<String>,
    out_dir: Option<PathBuf>,
    no_save: bool,
    pretty: bool,
}

fn usage() -> &'static str {
    "casemap\n\
\n\
USAGE:\n\
  casemap [run] --project <path> --case-id <id> --parcels <ids> [--case-name <name>] [--manager <name>] [--carto-code <code>] [--config <path>] [--out-dir <dir>] [--no-save] [--pretty]\n\
  casemap inspect --project <path> [--pretty]\n\
  casemap query --parcels <ids> [--config <path>] [--pretty]\n\
\n\
NOTES:\n\
  - <ids> is free text: identifiers separated by commas and/or whitespace; '-' is ignored.\n\
  - --config takes a JSON or YAML file (.yaml/.yml) with partial overrides of the defaults.\n\
  - run writes <case>_Aerial.pdf and <case>_Overlay.pdf and prints a JSON report.\n\
  - Logs go to stderr; set RUST_LOG to change the level (default: info).\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        let mut value = || it.next().cloned().ok_or(CliError::Usage(usage()));
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "run" => args.command = Command::Run,
            "inspect" => args.command = Command::Inspect,
            "query" => args.command = Command::Query,
            "--project" => args.project = Some(PathBuf::from(value()?)),
            "--config" => args.config = Some(PathBuf::from(value()?)),
            "--case-name" => args.metadata.project_name = value()?,
            "--case-id" => args.metadata.case_id = value()?,
            "--manager" => args.metadata.project_manager = value()?,
            "--carto-code" => args.metadata.carto_code = value()?,
            "--parcels" => args.parcels = Some(value()?),
            "--out-dir" => args.out_dir = Some(PathBuf::from(value()?)),
            "--no-save" => args.no_save = true,
            "--pretty" => args.pretty = true,
            _ => return Err(CliError::Usage(usage())),
        }
    }
    Ok(args)
}

fn load_config(path: Option<&Path>) -> Result<ExhibitConfig, CliError> {
    let Some(path) = path else {
        return Ok(ExhibitConfig::default());
    };
    let text = std::fs::read_to_string(path)?;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let config = if yaml {
        ExhibitConfig::from_yaml_str(&text)?
    } else {
        ExhibitConfig::from_json_str(&text)?
    };
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn write_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

#[derive(Serialize)]
struct LayerOut<'a> {
    name: &'a str,
    features: usize,
    fields: Vec<&'a str>,
}

#[derive(Serialize)]
struct MapOut<'a> {
    name: &'a str,
    layers: Vec<LayerOut<'a>>,
}

#[derive(Serialize)]
struct LayoutOut<'a> {
    name: &'a str,
    frames: Vec<&'a str>,
    texts: Vec<&'a str>,
}

#[derive(Serialize)]
struct InspectOut<'a> {
    maps: Vec<MapOut<'a>>,
    layouts: Vec<LayoutOut<'a>>,
}

#[derive(Serialize)]
struct QueryOut<'a> {
    identifiers: Vec<String>,
    field: &'a str,
    predicate: String,
}

fn inspect(project: &Project) -> InspectOut<'_> {
    InspectOut {
        maps: project
            .maps
            .iter()
            .map(|map| MapOut {
                name: &map.name,
                layers: map
                    .layers
                    .iter()
                    .map(|layer| LayerOut {
                        name: &layer.name,
                        features: layer.features.len(),
                        fields: layer.fields.iter().map(|f| f.name.as_str()).collect(),
                    })
                    .collect(),
            })
            .collect(),
        layouts: project
            .layouts
            .iter()
            .map(|layout| LayoutOut {
                name: &layout.name,
                frames: layout.frames.iter().map(|f| f.name.as_str()).collect(),
                texts: layout.texts.iter().map(|t| t.element.name.as_str()).collect(),
            })
            .collect(),
    }
}

fn run(args: Args) -> Result<(), CliError> {
    match args.command {
        Command::Query => {
            let Some(parcels) = args.parcels.as_deref() else {
                return Err(CliError::Usage(usage()));
            };
            let config = load_config(args.config.as_deref())?;
            let ids = sanitize_identifiers(parcels);
            let query = AttributeQuery::build(&config.id_field, &ids);
            write_json(
                &QueryOut {
                    identifiers: ids.into_iter().map(|id| id.into_string()).collect(),
                    field: &config.id_field,
                    predicate: query.predicate(),
                },
                args.pretty,
            )
        }
        Command::Inspect => {
            let Some(path) = args.project.as_deref() else {
                return Err(CliError::Usage(usage()));
            };
            let project = Project::open(path)?;
            tracing::debug!(
                maps = ?project.map_names(),
                layouts = ?project.layout_names(),
                "inspecting"
            );
            write_json(&inspect(&project), args.pretty)
        }
        Command::Run => {
            let (Some(path), Some(parcels)) = (args.project.as_deref(), args.parcels) else {
                return Err(CliError::Usage(usage()));
            };
            let mut config = load_config(args.config.as_deref())?;
            if let Some(dir) = args.out_dir {
                config.output_dir = dir;
            }
            let params = CaseParameters {
                metadata: args.metadata,
                parcels,
            };

            let mut project = Project::open(path)?;
            let exporter = PdfExporter::default();
            let mut session = Session::new(&mut project, &config).with_save(!args.no_save);
            let report = session.run_case(&params, &exporter)?;
            write_json(&report, args.pretty)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_tracing();

    match run(args) {
        Ok(()) => {}
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
