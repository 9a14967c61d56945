//! trailfab - GPX track to plotter and laser artwork
//!
//! Usage:
//!   trailfab generate --gpx <file> --data <dir> [options]
//!   trailfab defaults
//!   trailfab help

use std::env;

mod cli;

use cli::{cmd_defaults, cmd_generate};

fn main() {
    let args: Vec<String> = env::args().collect();

    let result = match args.get(1).map(String::as_str) {
        Some("generate") => {
            if args[2..].iter().any(|a| a == "-h" || a == "--help") {
                cli::generate::print_usage();
                return;
            }
            cmd_generate(&args[2..])
        }
        Some("defaults") => cmd_defaults(),
        Some("help" | "--help" | "-h") => {
            print_usage(&args[0]);
            return;
        }
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            eprintln!();
            print_usage(&args[0]);
            std::process::exit(1);
        }
        None => {
            print_usage(&args[0]);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn print_usage(prog: &str) {
    eprintln!("trailfab - GPX track to plotter and laser artwork");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {} generate --gpx <file> --data <dir> [options]", prog);
    eprintln!("  {} defaults                     Print the default config (YAML)", prog);
    eprintln!("  {} help                         Show this message", prog);
    eprintln!();
    eprintln!("Generate options:");
    eprintln!("  -c, --config <yaml>    Config file (default: built-in defaults)");
    eprintln!("  -o, --out <dir>        Output directory (default: .)");
    eprintln!("  --country <name>       Override the configured country");
    eprintln!("  --no-preview           Skip the PNG preview");
    eprintln!("  -v, --verbose          Debug logging (RUST_LOG overrides)");
    eprintln!("  --json                 Print a JSON summary to stdout");
    eprintln!();
    eprintln!("Outputs (per toggles in the config):");
    eprintln!("  plotter_<W>x<H>mm.svg  Pen layers: borders, water, trail, text");
    eprintln!("  laser_<W>x<H>mm.svg    Cut, contour, stitch and engrave layers");
    eprintln!("  preview_<W>x<H>mm.png  150 DPI preview");
    eprintln!();
    eprintln!("Datasets are read from <dir>/<id>.geojson (Natural Earth 10m ids by default).");
}
