use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};

use facetrack_core::detection::infrastructure::scripted_backend::FaceTrace;
use facetrack_core::pipeline::pipeline_logger::{report_cycle, PipelineLogger, TrackingStatsLogger};
use facetrack_core::pipeline::tracking_config::TrackingConfig;
use facetrack_core::pipeline::tracking_cycle::{CycleOutput, TrackingBackends, TrackingCycle};
use facetrack_core::shared::face_observation::FaceObservation;
use facetrack_core::shared::rect::Rect;
use facetrack_core::video::domain::frame_source::FrameSource;
use facetrack_core::video::infrastructure::image_sequence_reader::{
    BlankFrameSource, ImageSequenceReader,
};

/// Multi-face tracking: configuration and trace replay.
#[derive(Parser)]
#[command(name = "facetrack")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the tracking configuration file.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Run the tracker over a recorded face trace, one JSON line per frame.
    Replay(ReplayArgs),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write the default configuration.
    Init {
        /// Config file (defaults to the platform config directory).
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration as JSON.
    Show {
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Check a configuration file for invalid values.
    Validate {
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ReplayArgs {
    /// Trace JSON with the faces visible in each frame.
    trace: PathBuf,

    /// Config file (defaults to the platform config, then built-in defaults).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of frame images; blank frames are used otherwise.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Track a single face.
    #[arg(long)]
    single: bool,

    /// Number of model slots in multi-face mode.
    #[arg(long)]
    max_faces: Option<usize>,

    /// Time a face survives without a confident sighting.
    #[arg(long)]
    persistence_ms: Option<u64>,

    /// Largest distance (pixels) at which a face keeps its label.
    #[arg(long)]
    max_distance: Option<f64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Config(command) => run_config(command),
        Command::Replay(args) => run_replay(args),
    }
}

fn config_path(path: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(path),
        None => Ok(TrackingConfig::default_path()?),
    }
}

fn run_config(command: ConfigCommand) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        ConfigCommand::Init { path, force } => {
            let path = config_path(path)?;
            if path.exists() && !force {
                return Err(format!("{} already exists (use --force)", path.display()).into());
            }
            TrackingConfig::default().save(&path)?;
            println!("Wrote {}", path.display());
        }
        ConfigCommand::Show { path } => {
            let config = match path {
                Some(path) => TrackingConfig::load(&path)?,
                None => TrackingConfig::load_or_default()?,
            };
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Validate { path } => {
            let path = config_path(path)?;
            TrackingConfig::load(&path)?;
            println!("{} is valid", path.display());
        }
    }
    Ok(())
}

fn replay_config(args: &ReplayArgs) -> Result<TrackingConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => TrackingConfig::load(path)?,
        None => TrackingConfig::load_or_default()?,
    };
    if args.single {
        config.track_multiple_faces = false;
    }
    if let Some(max_faces) = args.max_faces {
        config.max_faces = max_faces;
    }
    if let Some(persistence_ms) = args.persistence_ms {
        config.persistence_ms = persistence_ms;
    }
    if let Some(max_distance) = args.max_distance {
        config.max_distance_px = max_distance;
    }
    config.validate()?;
    Ok(config)
}

fn open_frames(
    args: &ReplayArgs,
    config: &TrackingConfig,
    trace: &FaceTrace,
) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    match &args.frames {
        Some(dir) => Ok(Box::new(ImageSequenceReader::open(
            dir,
            config.image_width,
            config.image_height,
        )?)),
        None => Ok(Box::new(BlankFrameSource::new(
            trace.len(),
            config.image_width,
            config.image_height,
        ))),
    }
}

fn run_replay(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = replay_config(&args)?;
    let trace = Arc::new(FaceTrace::load(&args.trace)?);
    let mut source = open_frames(&args, &config, &trace)?;
    if source.len_hint().is_some_and(|n| n != trace.len()) {
        log::warn!(
            "Trace has {} frames, frame source has {:?}",
            trace.len(),
            source.len_hint()
        );
    }

    let mut cycle = TrackingCycle::new(&config, TrackingBackends::scripted(Arc::clone(&trace)))?;
    let mut logger = TrackingStatsLogger::default();
    let start = Instant::now();
    let mut processed = 0u64;

    for frame in source.frames() {
        let frame = frame?;
        // Replay runs on the trace's clock, not the wall clock.
        let now = start + trace.frame_time(frame.index());
        let output = cycle.run(&frame, now);
        processed += 1;

        report_cycle(&mut logger, &output.report, output.identity_ms, output.tracked.len());
        logger.cycle_completed(output.frame_index, processed);
        println!("{}", frame_line(&output, now));
    }

    logger.summary();
    Ok(())
}

fn rect_json(rect: &Rect) -> Value {
    json!([rect.x, rect.y, rect.width, rect.height])
}

fn observation_json(obs: &FaceObservation) -> Value {
    let (yaw, pitch) = obs.gaze_angle();
    json!({
        "slot": obs.slot,
        "face_id": obs.face_id,
        "certainty": obs.certainty,
        "box": rect_json(&obs.bounding_box),
        "gaze": [yaw, pitch],
    })
}

fn frame_line(output: &CycleOutput, now: Instant) -> Value {
    let detections: Vec<Value> = output
        .observations
        .iter()
        .filter(|o| o.detected)
        .map(observation_json)
        .collect();
    let tracked: Vec<Value> = output
        .tracked
        .iter()
        .map(|face| {
            json!({
                "label": face.label,
                "slot": face.observation.slot,
                "box": rect_json(&face.observation.bounding_box),
                "certainty": face.observation.certainty,
                "age_ms": face.age(now).as_millis() as u64,
            })
        })
        .collect();
    json!({
        "frame": output.frame_index,
        "detections": detections,
        "tracked": tracked,
    })
}

