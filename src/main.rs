use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use reactive_grid::color::{color_parameter, ColorNormalizationRange, ColorScheme};
use reactive_grid::driver::GridCollection;
use reactive_grid::error_codes::find_coded_error;
use reactive_grid::grid::sample_motion;
use reactive_grid::manifest::{
    finalize_config, load_and_validate_config_with_options, ConfigLoadOptions, ParamOverride,
};
use reactive_grid::motion::{MotionKind, Orientation, GRID_SIZE};
use reactive_grid::raster::RasterLayout;
use reactive_grid::render::{render_sequence, RenderOptions};
use reactive_grid::schema::GridConfig;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("RGRID_GIT_HASH"), ")");

#[derive(Debug, Parser)]
#[command(name = "rgrid")]
#[command(about = "Reactive grid motion engine")]
#[command(version = VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate a configuration and summarise its grids.
    Check {
        config: Option<PathBuf>,
        #[arg(long = "set", value_name = "KEY=VALUE")]
        sets: Vec<String>,
    },
    /// List motions and colour schemes.
    List,
    /// Print the projected weights of one motion at an absolute time.
    Sample {
        #[arg(short = 'm', long = "motion")]
        motion: String,
        #[arg(short = 't', long = "time", default_value_t = 0.0)]
        time: f64,
        #[arg(long = "orientation")]
        orientation: Option<String>,
        #[arg(long = "scheme", default_value = "Viridis")]
        scheme: String,
    },
    /// Simulate frames and write them as PNGs or an ffmpeg-encoded video.
    Render {
        config: Option<PathBuf>,
        #[arg(short = 'n', long = "frames", default_value_t = 120)]
        frames: u32,
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
        #[arg(long = "fps", default_value_t = 60)]
        fps: u32,
        #[arg(long = "tile", default_value_t = 160)]
        tile: u32,
        #[arg(long = "set", value_name = "KEY=VALUE")]
        sets: Vec<String>,
        /// Print a hash of the rendered frame sequence.
        #[arg(long = "digest")]
        digest: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { config, sets } => run_check(config.as_deref(), &sets),
        Commands::List => run_list(),
        Commands::Sample {
            motion,
            time,
            orientation,
            scheme,
        } => run_sample(&motion, time, orientation.as_deref(), &scheme),
        Commands::Render {
            config,
            frames,
            output,
            fps,
            tile,
            sets,
            digest,
        } => run_render(config.as_deref(), &sets, frames, output, fps, tile, digest),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_error(&error);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn report_error(error: &anyhow::Error) {
    match find_coded_error(error) {
        Some(coded) => match serde_json::to_string(&coded.envelope()) {
            Ok(envelope) => eprintln!("{envelope}"),
            Err(_) => eprintln!("error: {error:#}"),
        },
        None => eprintln!("error: {error:#}"),
    }
}

fn load_config(path: Option<&Path>, sets: &[String]) -> Result<GridConfig> {
    let options = ConfigLoadOptions {
        overrides: sets
            .iter()
            .map(|raw| ParamOverride::parse(raw))
            .collect::<Result<Vec<_>>>()?,
    };
    match path {
        Some(path) => load_and_validate_config_with_options(path, &options),
        None => finalize_config(GridConfig::default(), &options),
    }
}

fn run_check(path: Option<&Path>, sets: &[String]) -> Result<()> {
    let config = load_config(path, sets)?;
    let collection = GridCollection::from_config(&config)?;
    let source = path.map_or_else(|| "<default>".to_owned(), |path| path.display().to_string());

    println!(
        "OK: {} ({} grids, scheme {}, speed {})",
        source,
        collection.len(),
        config.params.scheme,
        config.params.speed
    );
    for grid in collection.grids() {
        println!(
            "  {:<14} {:<12} {}",
            grid.label(),
            grid.kind().name(),
            grid.orientation().keyword()
        );
    }
    Ok(())
}

fn run_list() -> Result<()> {
    println!("Motions:");
    for kind in MotionKind::ALL {
        let range = ColorNormalizationRange::for_motion(kind);
        println!(
            "  {:<12} {:<4} color range [{}, {}]",
            kind.name(),
            kind.natural_orientation().keyword(),
            range.min,
            range.max
        );
    }
    println!("Schemes:");
    for scheme in ColorScheme::ALL {
        println!("  {}", scheme.name());
    }
    Ok(())
}

fn run_sample(motion: &str, time: f64, orientation: Option<&str>, scheme: &str) -> Result<()> {
    let kind = MotionKind::resolve(motion);
    let orientation = match orientation {
        Some(keyword) => Orientation::from_keyword(keyword)?,
        None => kind.natural_orientation(),
    };
    let frame = sample_motion(kind, orientation, time);

    let mut color_parameters = [[0.0; GRID_SIZE]; GRID_SIZE];
    let mut colors = vec![vec![None; GRID_SIZE]; GRID_SIZE];
    for row in 0..GRID_SIZE {
        for col in 0..GRID_SIZE {
            let t = color_parameter(frame.intensity[row][col]);
            color_parameters[row][col] = t;
            colors[row][col] = ColorScheme::from_name(scheme).map(|s| s.eval(t).to_hex());
        }
    }

    let outer_percentages = frame.outer_percentages();
    let report = json!({
        "requested_motion": motion,
        "frame": frame,
        "outer_percentages": outer_percentages,
        "color_parameters": color_parameters,
        "scheme": scheme,
        "colors": colors,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_render(
    path: Option<&Path>,
    sets: &[String],
    frames: u32,
    output: PathBuf,
    fps: u32,
    tile: u32,
    digest: bool,
) -> Result<()> {
    let config = load_config(path, sets)?;
    let options = RenderOptions {
        frames,
        fps,
        layout: RasterLayout {
            tile_px: tile,
            ..RasterLayout::default()
        },
        output,
    };
    let summary = render_sequence(&config, &options)?;

    println!(
        "Wrote {} frames ({}x{}) to {}",
        summary.frames,
        summary.width,
        summary.height,
        options.output.display()
    );
    if digest {
        println!("Sequence digest: 0x{:016x}", summary.digest);
    }
    Ok(())
}
