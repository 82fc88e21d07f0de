//! Document stage commands: each reads SVGs, runs one pipeline stage and
//! writes an SVG.

use std::path::Path;
use std::time::Instant;

use hollow::pipeline;

use super::common::{output_in, read_svg, report, write_svg, CliError, Settings};

/// Which inversion to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InvertMode {
    /// Level-1 mask over every shape.
    #[default]
    Mask,
    /// Level-1 mask without thin shapes.
    Filtered,
    /// One evenodd compound path, no masks.
    Evenodd,
}

pub fn cmd_invert(input: &Path, output: Option<&Path>, mode: InvertMode, settings: &Settings) -> Result<(), CliError> {
    let doc = read_svg(input)?;
    let start = Instant::now();
    let out = match mode {
        InvertMode::Mask => pipeline::invert(&doc, settings.fill()),
        InvertMode::Filtered => pipeline::invert_filtered(&doc, &settings.policy(), settings.fill()),
        InvertMode::Evenodd => pipeline::invert_evenodd(&doc, settings.fill()),
    };
    let out = report(out);
    eprintln!("Inverted ({:?}) in {:?}", mode, start.elapsed());
    write_svg(&out, output)
}

pub fn cmd_extract(input: &Path, output: Option<&Path>, settings: &Settings) -> Result<(), CliError> {
    let doc = read_svg(input)?;
    let policy = settings.config.extract_policy();
    eprintln!("Extracting enclosed regions (min dimension {})", policy.min_dimension);
    let out = report(pipeline::extract_enclosed(&doc, &policy, settings.fill()));
    write_svg(&out, output)
}

pub fn cmd_subtract(
    inverted: &Path,
    enclosed: &Path,
    output: Option<&Path>,
    settings: &Settings,
) -> Result<(), CliError> {
    let inverted = read_svg(inverted)?;
    let enclosed = read_svg(enclosed)?;
    let out = report(pipeline::subtract_enclosed(&inverted, &enclosed, settings.fill()));
    write_svg(&out, output)
}

pub fn cmd_cut(input: &Path, output: Option<&Path>, settings: &Settings) -> Result<(), CliError> {
    let doc = read_svg(input)?;
    let cut = report(pipeline::cut(&doc, &settings.policy(), &settings.config.remove_paths));
    eprintln!("Removed {} connectors, kept {} shapes", cut.removed, cut.kept);
    write_svg(&cut.document, output)
}

pub fn cmd_paths(input: &Path, output: Option<&Path>) -> Result<(), CliError> {
    let doc = read_svg(input)?;
    let out = report(pipeline::extract_paths(&doc));
    eprintln!("Kept {} paths", out.elements.len());
    write_svg(&out, output)
}

pub fn cmd_filter_thin(input: &Path, output: Option<&Path>, settings: &Settings) -> Result<(), CliError> {
    let doc = read_svg(input)?;
    let filtered = report(pipeline::filter_thin(&doc, &settings.policy(), settings.fill()));
    eprintln!(
        "Kept {} shapes, removed {} thin shapes",
        filtered.kept, filtered.removed
    );
    write_svg(&filtered.document, output)
}

pub fn cmd_thin_lines(
    inverted: &Path,
    original: &Path,
    output: Option<&Path>,
    settings: &Settings,
) -> Result<(), CliError> {
    let inverted = read_svg(inverted)?;
    let original = read_svg(original)?;
    let policy = settings.config.thin_lines_policy();
    let out = report(pipeline::remove_thin_lines(&inverted, &original, &policy, settings.fill()));
    write_svg(&out, output)
}

pub fn cmd_close_gaps(input: &Path, output: Option<&Path>, settings: &Settings) -> Result<(), CliError> {
    let doc = read_svg(input)?;
    let out = report(pipeline::close_gaps(&doc, &settings.policy(), settings.fill()));
    write_svg(&out, output)
}

/// Invert, extract and subtract in one go, writing all three documents.
pub fn cmd_run(input: &Path, out_dir: &Path, settings: &Settings) -> Result<(), CliError> {
    let doc = read_svg(input)?;
    let start = Instant::now();
    let run = report(pipeline::run(&doc, &settings.config));
    eprintln!("Pipeline finished in {:?}", start.elapsed());

    write_svg(&run.inverted, Some(&output_in(out_dir, "inverted.svg")?))?;
    write_svg(&run.enclosed, Some(&output_in(out_dir, "enclosed.svg")?))?;
    write_svg(&run.subtracted, Some(&output_in(out_dir, "subtracted.svg")?))?;
    Ok(())
}
