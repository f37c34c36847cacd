//! contour - Interpret PDF content streams
//!
//! Reads raw content stream files, interprets them against an optional
//! JSON resource table and prints the emitted elements as JSON.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use contour_core::utils::Rect;
use contour_core::{InterpreterOptions, Resources, interpret_content};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Interpret PDF content streams and print the drawable elements as JSON.
#[derive(Parser, Debug)]
#[command(name = "contour")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// One or more content stream files (raw, already decompressed)
    #[arg(required = true)]
    content: Vec<PathBuf>,

    /// JSON file with the resource tables (fonts, ExtGState, shadings, ...)
    #[arg(short = 'r', long)]
    resources: Option<PathBuf>,

    /// Raster budget for exact clip masks (0 keeps bbox clipping only)
    #[arg(long = "clip-budget", default_value_t = 0)]
    clip_budget: u32,

    /// Raster budget for soft mask groups
    #[arg(long = "mask-budget", default_value_t = 256)]
    mask_budget: u32,

    /// Raster budget for shadings
    #[arg(long = "shading-budget", default_value_t = 256)]
    shading_budget: u32,

    /// Soft mask nesting limit
    #[arg(long = "max-mask-depth", default_value_t = 8)]
    max_mask_depth: usize,

    /// Initial clip as x0,y0,x1,y1
    #[arg(long = "page-bbox", value_parser = parse_bbox)]
    page_bbox: Option<Rect>,

    /// Output file name ("-" for stdout)
    #[arg(short = 'o', long = "outfile", default_value = "-")]
    outfile: String,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,
}

/// Parse a page bbox given as four comma-separated numbers.
fn parse_bbox(s: &str) -> std::result::Result<Rect, String> {
    let values = s
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid number: {}", v))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match values[..] {
        [x0, y0, x1, y1] => Ok((x0, y0, x1, y1)),
        _ => Err(format!("expected 4 values, got {}", values.len())),
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();
}

fn build_options(args: &Args) -> InterpreterOptions {
    let mut options = InterpreterOptions::new()
        .with_clip_max_size(args.clip_budget)
        .with_soft_mask_max_size(args.mask_budget)
        .with_shading_max_size(args.shading_budget)
        .with_max_mask_depth(args.max_mask_depth);
    if let Some(bbox) = args.page_bbox {
        options = options.with_page_bbox(bbox);
    }
    options
}

fn load_resources(path: Option<&PathBuf>) -> Result<Resources> {
    let Some(path) = path else {
        return Ok(Resources::default());
    };
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(io::BufReader::new(file))
        .with_context(|| format!("parsing resources from {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let resources = load_resources(args.resources.as_ref())?;
    let options = build_options(&args);
    debug!(?options, "interpreter options");

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("creating output file {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };

    let mut documents = Vec::with_capacity(args.content.len());
    for path in &args.content {
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let elements = interpret_content(&data, &resources, &options)
            .with_context(|| format!("interpreting {}", path.display()))?;
        info!(file = %path.display(), count = elements.len(), "interpreted");
        documents.push(serde_json::json!({
            "file": path.display().to_string(),
            "elements": elements,
        }));
    }

    serde_json::to_writer_pretty(&mut output, &documents)?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}
