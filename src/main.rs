// SPDX-License-Identifier: MPL-2.0
use ad_lens::application::{Collaborators, Coordinator};
use ad_lens::config::{self, DetectorConfig};
use ad_lens::error::{Error, Result};
use ad_lens::infrastructure::engine::{self, onnx::MODEL_DIR_NAME, OnnxBackend};
use ad_lens::infrastructure::{
    ControlSurface, FileSettingsStore, ImageSequenceVideo, LogOverlay, SingleVideoLocator,
};
use ad_lens::paths;
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_FPS: f64 = 25.0;

const HELP: &str = "\
ad_lens - advertisement detection over an image sequence

USAGE:
  ad_lens [OPTIONS] <FRAMES_DIR>

OPTIONS:
  --config-dir DIR   Directory holding config.toml
  --data-dir DIR     Directory holding settings and models
  --model-dir DIR    Directory holding the ONNX model files
  --fps N            Playback frame rate [default: 25]
  --control          Read JSON control messages from stdin
  -h, --help         Print this help
";

struct Args {
    config_dir: Option<String>,
    data_dir: Option<String>,
    model_dir: Option<PathBuf>,
    fps: f64,
    control: bool,
    frames_dir: PathBuf,
}

fn parse_args() -> Result<Option<Args>> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(None);
    }

    let config_dir = args.opt_value_from_str("--config-dir")?;
    let data_dir = args.opt_value_from_str("--data-dir")?;
    let model_dir = args.opt_value_from_str("--model-dir")?;
    let fps = args.opt_value_from_str("--fps")?.unwrap_or(DEFAULT_FPS);
    let control = args.contains("--control");
    let frames_dir = args
        .finish()
        .into_iter()
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| Error::Args("missing <FRAMES_DIR>".into()))?;

    Ok(Some(Args {
        config_dir,
        data_dir,
        model_dir,
        fps,
        control,
        frames_dir,
    }))
}

/// Model directory: command line, then config, then `<data dir>/models`.
fn resolve_model_dir(cli: Option<PathBuf>, config: &DetectorConfig) -> PathBuf {
    cli.or_else(|| config.model_dir().map(PathBuf::from))
        .or_else(|| paths::get_app_data_dir().map(|dir| dir.join(MODEL_DIR_NAME)))
        .unwrap_or_else(|| PathBuf::from(MODEL_DIR_NAME))
}

async fn run(args: Args) -> Result<()> {
    let config = config::load()?;
    let mut store = FileSettingsStore::new()
        .ok_or_else(|| Error::Settings("no data directory available".into()))?;
    let settings = store.install_defaults()?;
    log::info!(
        "Settings: enabled={} debug={} model={}",
        settings.enabled_or_default(),
        settings.debug_or_default(),
        settings.model_id_or_default()
    );

    let video = ImageSequenceVideo::open(&args.frames_dir, args.fps)?;
    log::info!(
        "Playing {} frames from {} at {} fps",
        video.frame_count(),
        args.frames_dir.display(),
        args.fps
    );

    let model_dir = resolve_model_dir(args.model_dir, &config);
    log::info!("Loading models from {}", model_dir.display());
    let (link, worker) = engine::spawn(OnnxBackend::new(model_dir));

    let (coordinator, handle) = Coordinator::new(
        config,
        Collaborators {
            settings: Box::new(store.clone()),
            locator: Box::new(SingleVideoLocator::new(video.clone())),
            overlay: Box::new(LogOverlay::new()),
            engine: link,
        },
    );
    let session = tokio::spawn(coordinator.run());

    if args.control {
        let surface = ControlSurface::new(store, handle.clone());
        tokio::spawn(async move {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            match surface.run(stdin).await {
                Ok(applied) => log::debug!("Control input closed after {applied} messages"),
                Err(err) => log::warn!("Control input failed: {err}"),
            }
        });
    }

    video.play_to_end().await;
    handle.shutdown();

    if let Err(err) = session.await {
        log::error!("Detection session panicked: {err}");
    }
    if let Err(err) = worker.await {
        log::error!("Inference worker panicked: {err}");
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}\n\n{HELP}");
            return ExitCode::FAILURE;
        }
    };
    paths::init_cli_overrides(args.data_dir.clone(), args.config_dir.clone());

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            log::error!("Cannot start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(args));
    // Stdin reads sit on a blocking thread that never returns on its own.
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
