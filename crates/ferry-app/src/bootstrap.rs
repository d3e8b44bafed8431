//! Process boot sequence: configuration, logging, validation, orchestration.

use std::future::Future;

use ferry_config::{ConfigResult, Settings};
use ferry_telemetry::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, app_span, init_logging, log_format_from_config,
};
use tracing::{Instrument, error, info};

use crate::error::{AppError, AppResult};
use crate::orchestrator::{Orchestrator, RunExit};

/// Entry point for the ferry boot sequence.
///
/// Logging is installed even when the environment cannot be parsed so that
/// the configuration failure itself is reported.
///
/// # Errors
///
/// Returns an error for invalid configuration, a failed watch subscription,
/// or a signal handler that cannot be installed.
pub async fn run_app() -> AppResult<()> {
    let loaded = Settings::from_env();
    install_logging(&loaded)?;

    let settings = loaded.map_err(|err| {
        error!(error = ?err, "configuration could not be loaded");
        AppError::config("settings.from_env", err)
    })?;
    let span = app_span(settings.mode.as_str());
    run_with(settings, shutdown_signal()).instrument(span).await?;
    Ok(())
}

/// Boot sequence that relies entirely on injected settings and shutdown
/// trigger to simplify testing.
///
/// # Errors
///
/// Returns an error when validation fails or the orchestrator stops with one.
pub async fn run_with<F>(settings: Settings, shutdown: F) -> AppResult<RunExit>
where
    F: Future<Output = AppResult<&'static str>> + Send,
{
    info!("ferry starting");
    settings.log_effective();
    settings.validate().map_err(|err| {
        error!(error = ?err, "configuration rejected; refusing to start");
        AppError::config("settings.validate", err)
    })?;

    let exit = Orchestrator::new(&settings).run(shutdown).await?;
    info!(exit = exit.as_str(), "ferry stopped");
    Ok(exit)
}

fn install_logging(loaded: &ConfigResult<Settings>) -> AppResult<()> {
    let (level, format) = loaded.as_ref().map_or((DEFAULT_LOG_LEVEL, None), |settings| {
        (settings.log_level.as_str(), settings.log_format.as_deref())
    });
    let logging = LoggingConfig {
        level,
        format: log_format_from_config(format).unwrap_or_else(LogFormat::infer),
        ..LoggingConfig::default()
    };
    init_logging(&logging).map_err(|err| AppError::telemetry("telemetry.init", err))
}

/// Resolves with the signal name once SIGINT, SIGTERM, or SIGHUP arrives.
///
/// Handlers are installed on first poll, so signals received earlier keep
/// their default disposition.
async fn shutdown_signal() -> AppResult<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())
            .map_err(|err| AppError::signal("SIGTERM", err))?;
        let mut hangup =
            signal(SignalKind::hangup()).map_err(|err| AppError::signal("SIGHUP", err))?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result
                .map(|()| "SIGINT")
                .map_err(|err| AppError::signal("SIGINT", err)),
            _ = terminate.recv() => Ok("SIGTERM"),
            _ = hangup.recv() => Ok("SIGHUP"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .map(|()| "SIGINT")
            .map_err(|err| AppError::signal("SIGINT", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_config::RunMode;
    use ferry_test_support::fixtures::{ReplicaDirs, temp_dir, write_file};
    use std::collections::HashMap;
    use std::error::Error;

    type TestResult<T> = Result<T, Box<dyn Error>>;

    fn settings_for(vars: &[(&str, String)]) -> TestResult<Settings> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect();
        Ok(Settings::from_lookup(|name| env.get(name).cloned())?)
    }

    #[tokio::test]
    async fn one_shot_run_copies_and_exits() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-bootstrap-")?;
        write_file(&dirs.source, "nested/dir/report.pdf", b"%PDF")?;
        let settings = settings_for(&[
            ("SOURCE", dirs.source.display().to_string()),
            ("DESTINATION", dirs.destination.display().to_string()),
            ("MODE", "oneshot".to_string()),
        ])?;
        assert_eq!(settings.mode, RunMode::OneShot);

        let exit = run_with(settings, std::future::pending()).await?;

        assert_eq!(exit, RunExit::Completed);
        assert_eq!(std::fs::read(dirs.destination.join("report.pdf"))?, b"%PDF");
        Ok(())
    }

    #[tokio::test]
    async fn nested_destination_is_rejected_before_any_work() -> TestResult<()> {
        let temp = temp_dir("ferry-bootstrap-")?;
        let source = temp.path().join("source");
        let destination = source.join("mirror");
        std::fs::create_dir_all(&destination)?;
        write_file(&source, "a.bin", b"a")?;
        let settings = settings_for(&[
            ("SOURCE", source.display().to_string()),
            ("DESTINATION", destination.display().to_string()),
            ("MODE", "BOTH".to_string()),
        ])?;

        let result = run_with(settings, std::future::pending()).await;

        assert!(matches!(
            result,
            Err(AppError::Config {
                operation: "settings.validate",
                ..
            })
        ));
        assert!(!destination.join("a.bin").exists());
        Ok(())
    }

    #[tokio::test]
    async fn missing_source_is_rejected() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-bootstrap-")?;
        let settings = settings_for(&[
            ("SOURCE", dirs.temp.path().join("absent").display().to_string()),
            ("DESTINATION", dirs.destination.display().to_string()),
        ])?;
        let result = run_with(settings, std::future::pending()).await;
        assert!(matches!(result, Err(AppError::Config { .. })));
        Ok(())
    }
}
