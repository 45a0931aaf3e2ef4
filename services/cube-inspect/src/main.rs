//! Command-line inspection of Galileo SSI and New Horizons LORRI cubes.
//!
//! Prints cube summaries, pixel records, valid-region footprints as
//! GeoJSON, data/navigation offsets, photometric fits and geological
//! units. View settings come from the environment (`SSI_*`, `LORRI_SOURCE`)
//! and can be overridden on the command line.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use ssi::{fit, lookup_unit, AlignmentMode, Instrument, InstrumentView, ReferenceMap, ViewConfig};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "cube-inspect")]
#[command(about = "Inspect SSI and LORRI ISIS cubes")]
struct Args {
    /// ISIS cube file
    cube: PathBuf,

    /// Camera that produced the cube (ssi or lorri)
    #[arg(short, long, default_value = "ssi")]
    instrument: String,

    /// Alignment mode (none, data or navigation)
    #[arg(short, long, env = "SSI_ALIGNMENT")]
    alignment: Option<String>,

    /// Minimum contour length kept in footprints
    #[arg(long)]
    min_length: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cube identification and acquisition metadata
    Summary,

    /// Values of one pixel (1-based sample and line)
    Pixel {
        sample: i64,
        line: i64,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// GeoJSON footprint of the valid region
    Footprint {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Offset between the data and the navigation backplanes
    Offset,

    /// Photometric fit over the valid region
    Fit {
        /// minnaert or hapke
        #[arg(short, long, default_value = "minnaert")]
        model: String,
    },

    /// Geological unit under a pixel
    Unit {
        sample: i64,
        line: i64,

        /// Geological map image
        #[arg(long)]
        map: PathBuf,
    },
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn view_config(args: &Args) -> Result<ViewConfig> {
    let mut config = ViewConfig::from_env();
    if let Some(mode) = &args.alignment {
        config.alignment =
            AlignmentMode::parse(mode).ok_or_else(|| anyhow!("unknown alignment mode `{}`", mode))?;
    }
    if let Some(min_length) = args.min_length {
        config.contour_min_length = min_length;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs)?;

    let instrument = Instrument::parse(&args.instrument)
        .ok_or_else(|| anyhow!("unknown instrument `{}`", args.instrument))?;
    let config = view_config(&args)?;
    debug!(?config, "Loaded configuration");

    let view = InstrumentView::open(&args.cube, instrument, config)
        .with_context(|| format!("opening {}", args.cube.display()))?;

    match args.command {
        Command::Summary => {
            println!("{}", view.describe());
        }
        Command::Pixel { sample, line, json } => {
            let pixel = view.pixel(sample, line)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pixel)?);
            } else {
                println!("{}", pixel.describe());
            }
        }
        Command::Footprint { output } => {
            let geojson = view.footprint()?.to_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, geojson)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), "Footprint written");
                }
                None => println!("{}", geojson),
            }
        }
        Command::Offset => match view.offset()? {
            Some(offset) => println!("{}", serde_json::to_string(&offset)?),
            None => bail!("alignment is disabled, pass --alignment data or navigation"),
        },
        Command::Fit { model } => {
            let (a, b) = fit(&view, &view.valid()?, &model)?;
            println!("{} {}", a, b);
        }
        Command::Unit { sample, line, map } => {
            let target = view.target_name()?;
            let map = match target.to_lowercase().as_str() {
                "europa" => ReferenceMap::europa(&map),
                "pluto" => ReferenceMap::pluto(&map),
                _ => bail!("no geological legend for target `{}`", target),
            };
            let pixel = view.pixel(sample, line)?;
            let unit = lookup_unit(&map, f64::from(pixel.lon), f64::from(pixel.lat))?;
            println!("{}: {}", pixel, unit.unwrap_or("-"));
        }
    }

    Ok(())
}
