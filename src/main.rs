use clap::Parser;
use sr_tracker_lib::services::ocr::TesseractEngine;
use sr_tracker_lib::services::screen_capture::ScreenFrameSource;
use sr_tracker_lib::utils::init_logging;
use sr_tracker_lib::{
    ConfigManager, FileOverlaySink, LogOverlaySink, OverlaySink, SrTracker, TrackerConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Directory holding config.json (defaults to the platform config dir)
    #[arg(long)]
    config_dir: Option<PathBuf>,
    /// Sampler tick period in milliseconds
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
    /// How often config.json is re-read, in seconds
    #[arg(long, default_value_t = 2)]
    reload_secs: u64,
    /// Sample once immediately after startup
    #[arg(long)]
    test_ocr: bool,
    /// Write the current (or default) config and exit
    #[arg(long)]
    write_config: bool,
    /// Write the overlay label to the log instead of a file
    #[arg(long)]
    log_overlay: bool,
    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.json_logs, cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let manager = match &cli.config_dir {
        Some(dir) => ConfigManager::with_dir(dir.clone()),
        None => ConfigManager::new()?,
    };

    let config = manager.load()?;
    if cli.write_config {
        manager.save(&config)?;
        info!("Config written to {}", manager.config_file_path().display());
        return Ok(());
    }
    if !manager.config_exists() {
        warn!(
            "No config at {}, using defaults (run with --write-config to create one)",
            manager.config_file_path().display()
        );
    }

    let overlay: Arc<dyn OverlaySink> = if cli.log_overlay {
        Arc::new(LogOverlaySink)
    } else {
        let overlay_path = config
            .overlay_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| manager.default_overlay_path());
        info!("Overlay label file: {}", overlay_path.display());
        Arc::new(FileOverlaySink::new(overlay_path))
    };

    let tracker = Arc::new(
        SrTracker::start(
            &resolve_paths(config.clone()),
            Arc::new(ScreenFrameSource::new()),
            overlay,
            Box::new(TesseractEngine::new()),
        )
        .map_err(|e| format!("Failed to start tracker: {}", e))?,
    );

    if cli.test_ocr {
        tracker.force_capture();
    }

    let tick = Duration::from_millis(cli.tick_ms.max(1));
    let sampler = tokio::spawn(Arc::clone(&tracker).run_sampler(tick));
    let mut reload = tokio::time::interval(Duration::from_secs(cli.reload_secs.max(1)));
    let mut applied = config;

    loop {
        tokio::select! {
            _ = reload.tick() => {
                match manager.load() {
                    Ok(latest) if latest != applied => {
                        info!("Config changed, applying");
                        tracker.apply_config(&resolve_paths(latest.clone()));
                        applied = latest;
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Keeping previous config: {}", e),
                }
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Failed to listen for ctrl-c: {}", e);
                }
                break;
            }
        }
    }

    info!("Shutting down");
    tracker.shutdown().await;
    if let Err(e) = sampler.await {
        warn!("Sampler task failed: {}", e);
    }
    Ok(())
}

/// Resolve a relative tessdata path against the executable's directory when
/// it does not exist relative to the working directory
fn resolve_paths(mut config: TrackerConfig) -> TrackerConfig {
    let tessdata = Path::new(&config.tessdata_path);
    if tessdata.is_relative() && !tessdata.exists() {
        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(tessdata)))
            .filter(|path| path.exists());
        if let Some(path) = beside_exe {
            config.tessdata_path = path.to_string_lossy().into_owned();
        }
    }
    config
}
