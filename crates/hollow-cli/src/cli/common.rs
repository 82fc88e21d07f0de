//! Common utilities shared across CLI commands.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use hollow::policy::PolicyOverride;
use hollow::{ClassificationPolicy, Config, Diagnostic, Document, HollowError, Outcome};

/// Errors that end a CLI run with a non-zero exit code.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Hollow(#[from] HollowError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("resvg could not render {path}: {message}")]
    Render { path: String, message: String },
}

/// Configuration for one invocation: the YAML config (or defaults) with
/// command-line overrides folded in.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
}

impl Settings {
    pub fn load(
        config: Option<&Path>,
        min_dimension: Option<f64>,
        margin: Option<f64>,
        fill: Option<String>,
    ) -> Result<Self, CliError> {
        let mut config = match config {
            Some(path) => {
                eprintln!("Config: {}", path.display());
                Config::load(path)?
            }
            None => Config::default(),
        };

        // Flags win over every stage-specific threshold in the file.
        let flags = PolicyOverride {
            min_dimension,
            boundary_margin: margin,
            ..PolicyOverride::default()
        };
        config.policy = flags.merge_with(&config.policy);
        for stage in [&mut config.extract, &mut config.thin_lines] {
            stage.min_dimension = min_dimension.or(stage.min_dimension);
            stage.boundary_margin = margin.or(stage.boundary_margin);
        }
        if let Some(fill) = fill {
            config.fill = fill;
        }

        Ok(Self { config })
    }

    pub fn policy(&self) -> ClassificationPolicy {
        self.config.policy
    }

    pub fn fill(&self) -> &str {
        &self.config.fill
    }
}

/// Read an SVG from a path, or stdin for `-`.
pub fn read_svg(path: &Path) -> Result<Document, CliError> {
    let outcome = if path == Path::new("-") {
        eprintln!("Reading SVG from stdin...");
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        hollow::read_document(&content)?
    } else {
        eprintln!("Loading: {}", path.display());
        hollow::read_file(path)?
    };

    let doc = report(outcome);
    eprintln!(
        "Loaded {} elements, {} masks (canvas {}x{})",
        doc.elements.len(),
        doc.masks.len(),
        doc.canvas.width,
        doc.canvas.height
    );
    Ok(doc)
}

/// Print a stage's diagnostics and hand back its value.
pub fn report<T>(outcome: Outcome<T>) -> T {
    let (value, diagnostics) = outcome.into_parts();
    print_diagnostics(&diagnostics);
    value
}

pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        eprintln!("warning: {}", d);
    }
}

/// Write a document to `output`, or stdout when there is none.
pub fn write_svg(doc: &Document, output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => {
            hollow::write_file(doc, path)?;
            eprintln!("Wrote: {}", path.display());
        }
        None => print!("{}", hollow::write_document(doc)),
    }
    Ok(())
}

/// Write `content` to `output`, or stdout when there is none.
pub fn write_text(content: &str, output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("Wrote: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// `dir/name`, creating `dir` if needed.
pub fn output_in(dir: &Path, name: &str) -> Result<PathBuf, CliError> {
    fs::create_dir_all(dir)?;
    Ok(dir.join(name))
}
