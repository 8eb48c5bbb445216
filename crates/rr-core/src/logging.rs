//! Tracing setup shared by every binary linking the engine.
//!
//! Ranking results and reports are printed as JSON on stdout, so logs never
//! go there: they go to stderr, or to a daily-rotated file under `RR_LOG_DIR`.

use std::panic;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::run_id;

const DEFAULT_FILTER: &str = "info";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// `<dir>/<app>.log`, rotated daily.
    DailyFile(PathBuf),
}

/// Logging knobs read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub target: LogTarget,
    /// `RR_LOG`, then `RUST_LOG`, then `info`.
    pub filter: String,
    /// `RR_LOG_INCLUDE_BACKTRACE`: also run the default panic hook.
    pub include_backtrace: bool,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let target = lookup("RR_LOG_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(|dir| LogTarget::DailyFile(PathBuf::from(dir)))
            .unwrap_or(LogTarget::Stderr);
        let filter = lookup("RR_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let include_backtrace = lookup("RR_LOG_INCLUDE_BACKTRACE")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            target,
            filter,
            include_backtrace,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Routes panics through `tracing`, tagged with the process run id so a crash
/// can be matched to the ranking runs logged before it. Installed once per
/// process.
pub fn install_tracing_panic_hook(app_name: &'static str) {
    static INSTALLED: OnceLock<()> = OnceLock::new();

    INSTALLED.get_or_init(|| {
        let default_hook = panic::take_hook();
        let include_backtrace = LogSettings::from_env().include_backtrace;

        panic::set_hook(Box::new(move |info| {
            let thread = std::thread::current();
            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()));
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".into());

            tracing::error!(
                application = app_name,
                process_run_id = run_id::process(),
                thread = thread.name().unwrap_or("unnamed"),
                location = location.as_deref().unwrap_or("unknown"),
                panic_message = %message,
                "panic"
            );

            if include_backtrace {
                default_hook(info);
            }
        }));
    });
}

fn daily_file_writer(dir: &Path, app_name: &str) -> Option<BoxMakeWriter> {
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("cannot create log dir {}: {err}; logging to stderr", dir.display());
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(BoxMakeWriter::new(non_blocking))
}

/// Installs the global subscriber from [`LogSettings::from_env`]. A second
/// call is a no-op.
pub fn init_tracing_subscriber(app_name: &'static str) {
    init_with(app_name, &LogSettings::from_env());
}

pub fn init_with(app_name: &'static str, settings: &LogSettings) {
    let builder = tracing_subscriber::fmt().with_env_filter(settings.env_filter());

    let file_writer = match &settings.target {
        LogTarget::DailyFile(dir) => daily_file_writer(dir, app_name),
        LogTarget::Stderr => None,
    };
    let _ = match file_writer {
        Some(writer) => builder.with_writer(writer).with_ansi(false).try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    tracing::debug!(
        application = app_name,
        process_run_id = run_id::process(),
        filter = %settings.filter,
        "logging initialized"
    );
}
