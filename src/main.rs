use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use athome::config::{FileSettingsSource, SettingsSource};
use athome::lifecycle;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--version") {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let config_path = parse_config_path(&args).unwrap_or_else(|| PathBuf::from("config.json"));

    let initial_settings = match FileSettingsSource::load_sync(&config_path) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("failed to load configuration from {config_path:?}: {err}");
            return ExitCode::FAILURE;
        }
    };

    athome::tracing::init_tracing(initial_settings.log_level.as_deref());

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(initial_settings.worker_count)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to build async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let settings_source: Arc<dyn SettingsSource> = Arc::new(FileSettingsSource::new(config_path));

    let result = runtime.block_on(lifecycle::run(initial_settings, settings_source));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "node exited with a fatal error");
            ExitCode::FAILURE
        }
    }
}

fn parse_config_path(args: &[String]) -> Option<PathBuf> {
    args.iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}
