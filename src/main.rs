//! Rain alarm daemon
//!
//! Usage: `rainalarm_service [CONFIG] [--verify] [--replay FILE]`
//!
//! - `CONFIG` — TOML config file; falls back to `$RAINALARM_CONFIG`, then
//!   to built-in defaults.
//! - `--verify` — check the configured location once and exit.
//! - `--replay FILE` — read the page from `FILE` instead of the network.

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{mpsc, Arc};
use std::thread;

use rainalarm_service::config::{ServiceConfig, CONFIG_ENV_VAR};
use rainalarm_service::ingest::replay::ReplaySource;
use rainalarm_service::ingest::wetter::WetterClient;
use rainalarm_service::ingest::NowcastSource;
use rainalarm_service::logging::{self, Component, LogLevel};
use rainalarm_service::poller::Poller;
use rainalarm_service::publish::MqttPublisher;
use rainalarm_service::server::{self, AppState};
use rainalarm_service::store::ForecastStore;
use rainalarm_service::verify;

#[derive(Debug, Default)]
struct CliArgs {
    config_path: Option<PathBuf>,
    verify: bool,
    replay: Option<PathBuf>,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut parsed = CliArgs::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--verify" => parsed.verify = true,
                "--replay" => {
                    let file = args.next().ok_or("--replay needs a file argument")?;
                    parsed.replay = Some(PathBuf::from(file));
                }
                flag if flag.starts_with("--") => return Err(format!("unknown option {}", flag)),
                path if parsed.config_path.is_none() => parsed.config_path = Some(PathBuf::from(path)),
                extra => return Err(format!("unexpected argument {}", extra)),
            }
        }
        if parsed.config_path.is_none() {
            parsed.config_path = std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from);
        }
        Ok(parsed)
    }
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("usage: rainalarm_service [CONFIG] [--verify] [--replay FILE]");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::error(Component::System, None, &e.to_string());
            eprintln!("rainalarm_service: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<(), Box<dyn Error>> {
    let config = match &args.config_path {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };

    logging::init_logger(
        config.log_level().unwrap_or(LogLevel::Info),
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    );
    logging::info(Component::System, None, "start rainalarm_service");
    match &args.config_path {
        Some(path) => logging::info(
            Component::System,
            None,
            &format!("settings from {}", path.display()),
        ),
        None => logging::info(Component::System, None, "run with default settings"),
    }
    logging::info(Component::System, None, &format!("location: {}", config.location.uri));
    logging::info(
        Component::System,
        None,
        &format!("mqtt: {}:{} topic {}", config.mqtt.host, config.mqtt.port, config.mqtt.topic),
    );

    let source: Box<dyn NowcastSource + Send> = match &args.replay {
        Some(path) => Box::new(ReplaySource::new(path.clone())),
        None => Box::new(WetterClient::new(&config.location.base_url, config.request_timeout())?),
    };

    if args.verify {
        let result = verify::verify_location(source.as_ref(), &config.location.uri);
        verify::print_summary(&result);
        if let Ok(json) = serde_json::to_string(&result) {
            logging::debug(Component::System, None, &json);
        }
        return match result.status {
            verify::VerificationStatus::Failed => Err("location verification failed".into()),
            _ => Ok(()),
        };
    }

    let store = Arc::new(ForecastStore::new());
    let publisher = MqttPublisher::new(&config.mqtt.host, config.mqtt.port, &config.mqtt.client_id);
    let mut poller = Poller::new(
        source,
        Box::new(publisher),
        Arc::clone(&store),
        &config.location.uri,
        &config.mqtt.topic,
        config.poll_interval(),
    );

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let poller_handle = thread::Builder::new()
        .name("poller".to_string())
        .spawn(move || poller.run(&shutdown_rx))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let served = runtime.block_on(server::serve(addr, AppState::new(store), async {
        let _ = tokio::signal::ctrl_c().await;
        logging::info(Component::System, None, "shutdown requested");
    }));

    // Stop the poller whether the server exited cleanly or not.
    let _ = shutdown_tx.send(());
    if poller_handle.join().is_err() {
        logging::error(Component::System, None, "poller thread panicked");
    }
    served?;

    logging::info(Component::System, None, "stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<CliArgs, String> {
        CliArgs::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_cli_config_path_and_flags() {
        let parsed = args(&["rain.toml", "--verify", "--replay", "page.html"]).unwrap();
        assert_eq!(parsed.config_path, Some(PathBuf::from("rain.toml")));
        assert!(parsed.verify);
        assert_eq!(parsed.replay, Some(PathBuf::from("page.html")));
    }

    #[test]
    fn test_cli_replay_requires_file() {
        assert!(args(&["--replay"]).is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_flag_and_extra_path() {
        assert!(args(&["--loud"]).is_err());
        assert!(args(&["a.toml", "b.toml"]).is_err());
    }
}
