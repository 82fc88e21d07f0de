//! Shape size analysis command.
//!
//! Prints how many shapes fall into each size bucket and which are the
//! thinnest, to help pick a `--min-dimension`.
//!
//! # Examples
//!
//! ```bash
//! # Summary table
//! hollow analyze board.svg
//!
//! # JSON output for programmatic use
//! hollow analyze board.svg --json
//! ```

use std::path::Path;

use hollow::analysis::Report;

use super::common::{read_svg, CliError, Settings};

pub fn cmd_analyze(input: &Path, json: bool, settings: &Settings) -> Result<(), CliError> {
    let doc = read_svg(input)?;
    let report = hollow::analyze(&doc, &settings.policy());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human_readable(&report, settings.policy().min_dimension);
    }
    Ok(())
}

fn print_human_readable(report: &Report, min_dimension: f64) {
    let t = &report.totals;

    println!("Shape Analysis");
    println!("==============");
    println!();
    println!("Shapes: {}", t.shapes);
    println!("  valid: {} ({} outer, {} inner)", t.valid, t.outer, t.inner);
    println!("  thin (< {}): {}", min_dimension, t.thin);
    if t.degenerate > 0 {
        println!("  degenerate: {}", t.degenerate);
    }
    if t.connectors > 0 {
        println!("  connectors: {}", t.connectors);
    }

    println!();
    println!("Smaller side:");
    for bucket in &report.histogram {
        let range = match bucket.max {
            Some(max) => format!("{:>5} - {:<5}", bucket.min, max),
            None => format!("{:>5} +      ", bucket.min),
        };
        println!("  {}  {}", range, bucket.count);
    }

    if report.thinnest.is_empty() {
        return;
    }
    println!();
    println!("Thinnest {}:", report.thinnest.len());
    for s in &report.thinnest {
        let name = s.id.as_deref().unwrap_or("-");
        println!(
            "  #{:<5} {:<8} {:<12} {:.4} ({:.4} x {:.4})  {}",
            s.index,
            s.kind.tag(),
            name,
            s.min_side,
            s.width,
            s.height,
            s.preview
        );
    }
}
