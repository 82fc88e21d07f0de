//! hollow - CLI for inverting drawings and extracting enclosed regions
//!
//! Usage:
//!   hollow invert <svg> [-o out.svg]            Show everything no shape covers
//!   hollow extract <svg> [-o out.svg]           Gaps inside boundary-touching shapes
//!   hollow subtract <inverted> <enclosed>       Remove enclosed regions from an inversion
//!   hollow run <svg> --out-dir <dir>            All three of the above
//!   hollow analyze <svg> [--json]               Shape size report
//!   hollow raster <svg> -o out.png              Occupancy bitmap
//!   hollow verify <svg>                         Region rasterizer vs resvg
//!
//! Every SVG input accepts `-` for stdin. SVG output goes to stdout unless
//! `-o` is given. Status lines and warnings go to stderr.

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use cli::{CliError, InvertMode, RasterFlags, Settings};

#[derive(Parser, Debug)]
#[command(name = "hollow", version, about = "Invert vector drawings and extract enclosed regions")]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML config with thresholds and fill colour
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Thinness threshold, overriding every stage's value
    #[arg(long, global = true)]
    min_dimension: Option<f64>,

    /// Distance from the canvas edge that still counts as touching it
    #[arg(long, global = true)]
    margin: Option<f64>,

    /// Fill colour of the visible region
    #[arg(long, global = true)]
    fill: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Everything no shape covers
    Invert {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = InvertMode::Mask)]
        mode: InvertMode,
    },
    /// Gaps enclosed by boundary-touching shapes
    Extract {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Subtract an enclosed-region document from an inverted one
    Subtract {
        inverted: PathBuf,
        enclosed: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove connector artifacts and listed paths
    Cut {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Keep only paths
    Paths {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Drop thin shapes from an inverted document's mask
    FilterThin {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Mask the thin lines of an original drawing out of its inversion
    ThinLines {
        inverted: PathBuf,
        original: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Outline thin mask shapes to close hairline gaps
    CloseGaps {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Shape size histogram and thinnest shapes
    Analyze {
        input: PathBuf,
        /// JSON output instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Rasterize a document to a PNG
    Raster {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        raster: RasterFlags,
    },
    /// Rasterize two documents and subtract the second from the first
    RasterSubtract {
        inverted: PathBuf,
        enclosed: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        raster: RasterFlags,
    },
    /// Compare the region rasterizer with resvg (JSON on stdout)
    Verify {
        input: PathBuf,
        /// Write a diff PNG here
        #[arg(long)]
        diff: Option<PathBuf>,
        #[command(flatten)]
        raster: RasterFlags,
    },
    /// Invert, extract and subtract, writing all three documents
    Run {
        input: PathBuf,
        #[arg(long, default_value = "hollow-out")]
        out_dir: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = Settings::load(cli.config.as_deref(), cli.min_dimension, cli.margin, cli.fill)?;

    match cli.command {
        Command::Invert { input, output, mode } => cli::cmd_invert(&input, output.as_deref(), mode, &settings),
        Command::Extract { input, output } => cli::cmd_extract(&input, output.as_deref(), &settings),
        Command::Subtract { inverted, enclosed, output } => {
            cli::cmd_subtract(&inverted, &enclosed, output.as_deref(), &settings)
        }
        Command::Cut { input, output } => cli::cmd_cut(&input, output.as_deref(), &settings),
        Command::Paths { input, output } => cli::cmd_paths(&input, output.as_deref()),
        Command::FilterThin { input, output } => cli::cmd_filter_thin(&input, output.as_deref(), &settings),
        Command::ThinLines { inverted, original, output } => {
            cli::cmd_thin_lines(&inverted, &original, output.as_deref(), &settings)
        }
        Command::CloseGaps { input, output } => cli::cmd_close_gaps(&input, output.as_deref(), &settings),
        Command::Analyze { input, json } => cli::cmd_analyze(&input, json, &settings),
        Command::Raster { input, output, raster } => cli::cmd_raster(&input, &output, &raster, &settings),
        Command::RasterSubtract {
            inverted,
            enclosed,
            output,
            raster,
        } => cli::cmd_raster_subtract(&inverted, &enclosed, &output, &raster, &settings),
        Command::Verify { input, diff, raster } => {
            let config = raster.apply(&settings.config.raster);
            cli::cmd_verify(&input, &config, diff.as_deref())
        }
        Command::Run { input, out_dir } => cli::cmd_run(&input, &out_dir, &settings),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
