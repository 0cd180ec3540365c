use clap::{Parser, Subcommand};
use image_crop::engine::{Engine, Reply, Request};
use image_crop::imaging::{CropRegion, DisplayDimensions};
use image_crop::{bridge, config, output};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "image-crop")]
#[command(about = "Crop and downsample images, keeping descriptive EXIF metadata")]
#[command(long_about = "\
Crop and downsample images, keeping descriptive EXIF metadata

Every command writes a new JPEG into the scratch directory and prints its
path. Source files are never modified and outputs are never cleaned up.

  crop     Cut a fractional region out of the image as it is displayed
           (EXIF orientation applied), optionally scaled.
  sample   Shrink an image to fit maximum bounds, decoding at reduced
           resolution where possible. Camera, exposure and GPS tags are
           copied onto the output.
  options  Print the displayed width and height.
  serve    Answer JSON-lines calls on stdin/stdout:
           {\"id\": 1, \"request\": {\"method\": \"cropImage\", \"arguments\": {...}}}

Run 'image-crop gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for output files (overrides the config file)
    #[arg(long, global = true)]
    scratch_dir: Option<PathBuf>,

    /// Log decisions to stderr (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crop a region given as fractions of the displayed image
    Crop {
        path: PathBuf,
        #[arg(long)]
        left: f64,
        #[arg(long)]
        top: f64,
        #[arg(long)]
        right: f64,
        #[arg(long)]
        bottom: f64,
        /// Scale applied to the cropped region
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
    },
    /// Downsample to fit within maximum dimensions
    Sample {
        path: PathBuf,
        #[arg(long)]
        max_width: u32,
        #[arg(long)]
        max_height: u32,
    },
    /// Print the orientation-corrected dimensions
    Options { path: PathBuf },
    /// Answer JSON-lines requests on stdin, one response per line on stdout
    Serve,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let start = || start_engine(cli.config.as_deref(), cli.scratch_dir.clone());

    match cli.command {
        Command::Crop {
            path,
            left,
            top,
            right,
            bottom,
            scale,
        } => {
            let region = CropRegion::new(left, top, right, bottom, scale)?;
            let engine = start()?;
            let output_path = expect_path(engine.run(Request::CropImage {
                path: path.clone(),
                scale,
                left,
                top,
                right,
                bottom,
            })?)?;
            let dims = output_dimensions(&engine, &output_path);
            output::print_crop_output(&path, &region, &output_path, dims);
            engine.shutdown();
        }
        Command::Sample {
            path,
            max_width,
            max_height,
        } => {
            let engine = start()?;
            let output_path = expect_path(engine.run(Request::SampleImage {
                path: path.clone(),
                maximum_width: max_width,
                maximum_height: max_height,
            })?)?;
            let dims = output_dimensions(&engine, &output_path);
            output::print_sample_output(&path, (max_width, max_height), &output_path, dims);
            engine.shutdown();
        }
        Command::Options { path } => {
            let engine = start()?;
            match engine.run(Request::GetImageOptions { path: path.clone() })? {
                Reply::Options(dims) => output::print_options_output(&path, dims),
                other => return Err(format!("unexpected reply: {other:?}").into()),
            }
            engine.shutdown();
        }
        Command::Serve => {
            let engine = start()?;
            let input = std::io::BufReader::new(std::io::stdin());
            let stdout = std::io::stdout();
            let answered = bridge::serve(&engine, input, stdout.lock())?;
            log::info!("Answered {answered} calls");
            engine.shutdown();
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config, apply CLI overrides and start the worker pool.
fn start_engine(
    config_path: Option<&Path>,
    scratch_dir: Option<PathBuf>,
) -> Result<Engine, Box<dyn std::error::Error>> {
    let mut engine_config = config::load_config(config_path)?;
    if let Some(dir) = scratch_dir {
        engine_config.scratch_dir = Some(dir);
    }
    Ok(Engine::from_config(&engine_config)?)
}

/// Initialize `env_logger`: `warn` by default, `-v` for debug, `-vv` for
/// trace. `RUST_LOG` wins when set.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn expect_path(reply: Reply) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match reply {
        Reply::Path(path) => Ok(path),
        other => Err(format!("unexpected reply: {other:?}").into()),
    }
}

/// Dimensions of a freshly written output, for display only.
fn output_dimensions(engine: &Engine, path: &Path) -> Option<DisplayDimensions> {
    match engine.run(Request::GetImageOptions {
        path: path.to_path_buf(),
    }) {
        Ok(Reply::Options(dims)) => Some(dims),
        _ => None,
    }
}
