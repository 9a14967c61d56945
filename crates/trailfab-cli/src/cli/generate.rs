//! Generate command implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, bail};
use serde::Serialize;
use tracing::info;

use trailfab_core::{
    Config, DirectorySource, TracingObserver, generate, parse_gpx_file, render_documents, size_suffix,
};

use super::common::{flag_value, init_logging};
use super::preview::render_preview_png;

/// Parsed `generate` arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateArgs {
    pub gpx: PathBuf,
    pub data: PathBuf,
    pub config: Option<PathBuf>,
    pub out: PathBuf,
    pub country: Option<String>,
    pub preview: bool,
    pub verbose: bool,
    pub json: bool,
}

/// Machine-readable run summary for `--json`.
#[derive(Debug, Serialize)]
struct GenerateReport {
    country: String,
    track_points: usize,
    engrave_polygons: usize,
    cut_polygons: usize,
    border_lines: usize,
    river_lines: usize,
    lakes: usize,
    files: Vec<String>,
}

impl GenerateArgs {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut gpx = None;
        let mut data = None;
        let mut config = None;
        let mut out = PathBuf::from(".");
        let mut country = None;
        let mut preview = true;
        let mut verbose = false;
        let mut json = false;

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--gpx" => {
                    i += 1;
                    gpx = Some(PathBuf::from(flag_value(args, i, flag)?));
                }
                "--data" => {
                    i += 1;
                    data = Some(PathBuf::from(flag_value(args, i, flag)?));
                }
                "-c" | "--config" => {
                    i += 1;
                    config = Some(PathBuf::from(flag_value(args, i, flag)?));
                }
                "-o" | "--out" => {
                    i += 1;
                    out = PathBuf::from(flag_value(args, i, flag)?);
                }
                "--country" => {
                    i += 1;
                    country = Some(flag_value(args, i, flag)?.to_string());
                }
                "--no-preview" => preview = false,
                "-v" | "--verbose" => verbose = true,
                "--json" => json = true,
                other => bail!("Unknown argument: {}", other),
            }
            i += 1;
        }

        let Some(gpx) = gpx else {
            bail!("--gpx <file> is required");
        };
        let Some(data) = data else {
            bail!("--data <dir> is required");
        };

        Ok(Self { gpx, data, config, out, country, preview, verbose, json })
    }
}

/// Execute the generate command.
pub fn cmd_generate(args: &[String]) -> anyhow::Result<()> {
    let args = GenerateArgs::parse(args)?;
    init_logging(args.verbose);
    let start = Instant::now();

    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(country) = &args.country {
        config.country = country.clone();
    }

    let track = parse_gpx_file(&args.gpx).with_context(|| format!("Failed to read GPX {}", args.gpx.display()))?;
    info!(points = track.len(), country = %config.country, "Generating");

    let source = DirectorySource::new(&args.data);
    let composition = generate(&config, &track, &source, &TracingObserver)
        .with_context(|| format!("Generation failed for {}", config.country))?;
    let documents = render_documents(&composition, &config, &TracingObserver);

    fs::create_dir_all(&args.out).with_context(|| format!("Failed to create {}", args.out.display()))?;
    let suffix = size_suffix(&config);
    let mut files = Vec::new();

    if let Some(svg) = &documents.plotter {
        files.push(write_output(&args.out.join(format!("plotter_{}.svg", suffix)), svg.as_bytes())?);
    }
    if let Some(svg) = &documents.laser {
        files.push(write_output(&args.out.join(format!("laser_{}.svg", suffix)), svg.as_bytes())?);
    }
    if args.preview {
        if let Some(svg) = documents.preview_source() {
            let png = render_preview_png(svg, config.page.width_mm)?;
            files.push(write_output(&args.out.join(format!("preview_{}.png", suffix)), &png)?);
        }
    }

    info!("Done in {:.2}s", start.elapsed().as_secs_f64());

    if args.json {
        let report = GenerateReport {
            country: config.country.clone(),
            track_points: track.len(),
            engrave_polygons: composition.engrave.len(),
            cut_polygons: composition.cut.len(),
            border_lines: composition.border_lines.len(),
            river_lines: composition.river_lines.len(),
            lakes: composition.lake_polygons.len(),
            files,
        };
        println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialize report")?);
    }
    Ok(())
}

/// Write one output file and return its path for the report.
fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<String> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(bytes = bytes.len(), "Wrote {}", path.display());
    Ok(path.display().to_string())
}

/// Print usage information.
pub fn print_usage() {
    eprintln!("trailfab generate - Build plotter and laser artwork from a GPX track");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    trailfab generate --gpx <file> --data <dir> [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    --gpx <file>         GPX track (required)");
    eprintln!("    --data <dir>         Directory of <dataset>.geojson files (required)");
    eprintln!("    -c, --config <yaml>  Config file (default: built-in defaults)");
    eprintln!("    -o, --out <dir>      Output directory (default: .)");
    eprintln!("    --country <name>     Override the configured country");
    eprintln!("    --no-preview         Skip the PNG preview");
    eprintln!("    -v, --verbose        Debug logging (RUST_LOG overrides)");
    eprintln!("    --json               Print a JSON summary to stdout");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_all_flags() {
        let parsed = GenerateArgs::parse(&args(&[
            "--gpx", "t.gpx", "--data", "ne", "--config", "c.yaml", "--out", "build",
            "--country", "Slovakia", "--no-preview", "--verbose", "--json",
        ]))
        .unwrap();
        assert_eq!(parsed, GenerateArgs {
            gpx: "t.gpx".into(),
            data: "ne".into(),
            config: Some("c.yaml".into()),
            out: "build".into(),
            country: Some("Slovakia".to_string()),
            preview: false,
            verbose: true,
            json: true,
        });
    }

    #[test]
    fn defaults_for_optional_flags() {
        let parsed = GenerateArgs::parse(&args(&["--gpx", "t.gpx", "--data", "ne"])).unwrap();
        assert_eq!(parsed.out, PathBuf::from("."));
        assert!(parsed.preview);
        assert!(!parsed.verbose);
        assert!(parsed.config.is_none());
    }

    #[test]
    fn required_flags_are_enforced() {
        assert!(GenerateArgs::parse(&args(&["--data", "ne"])).is_err());
        assert!(GenerateArgs::parse(&args(&["--gpx", "t.gpx"])).is_err());
        assert!(GenerateArgs::parse(&args(&["--gpx"])).is_err());
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let err = GenerateArgs::parse(&args(&["--gpx", "t.gpx", "--data", "ne", "--fast"])).unwrap_err();
        assert!(err.to_string().contains("--fast"));
    }
}
