use std::any::Any;
use std::env;
use std::panic::{self, PanicHookInfo};
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_DIR_ENV: &str = "AR_LOG_DIR";
pub const LOG_BACKTRACE_ENV: &str = "AR_LOG_INCLUDE_BACKTRACE";

/// Used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Daily rotated `<dir>/<app>.log` instead of stdout.
    pub directory: Option<PathBuf>,
    /// Also run the default panic hook (prints the backtrace).
    pub include_backtrace: bool,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self {
            directory: env::var_os(LOG_DIR_ENV)
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            include_backtrace: env::var(LOG_BACKTRACE_ENV)
                .map(|raw| truthy(&raw))
                .unwrap_or(false),
        }
    }
}

fn truthy(raw: &str) -> bool {
    let raw = raw.trim();
    raw == "1" || raw.eq_ignore_ascii_case("true")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

fn panic_location(info: &PanicHookInfo<'_>) -> String {
    info.location()
        .map(|loc| format!("{}:{}", loc.file(), loc.line()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Sends panics to the `tracing` pipeline. Only the first call installs
/// the hook.
pub fn install_tracing_panic_hook(app_name: &'static str) {
    static HOOKED: OnceLock<()> = OnceLock::new();

    HOOKED.get_or_init(|| {
        let include_backtrace = LogSettings::from_env().include_backtrace;
        let previous = panic::take_hook();

        panic::set_hook(Box::new(move |info| {
            let current = std::thread::current();
            tracing::error!(
                application = app_name,
                thread = current.name().unwrap_or("unnamed"),
                location = %panic_location(info),
                message = %panic_message(info.payload()),
                "panic"
            );

            if include_backtrace {
                previous(info);
            }
        }));
    });
}

fn file_writer(settings: &LogSettings, app_name: &str) -> Option<BoxMakeWriter> {
    let dir = settings.directory.as_ref()?;
    if let Err(err) = std::fs::create_dir_all(dir) {
        // no subscriber yet, so stderr is the only sink
        eprintln!("{LOG_DIR_ENV}={} unusable ({err}), logging to stdout", dir.display());
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    let (writer, guard) = tracing_appender::non_blocking(appender);
    FILE_GUARD.set(guard).ok()?;
    Some(BoxMakeWriter::new(writer))
}

/// Installs the global subscriber for a binary. Repeated calls are no-ops.
pub fn init_tracing_subscriber(app_name: &'static str) {
    let settings = LogSettings::from_env();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match file_writer(&settings, app_name) {
        Some(writer) => builder.with_ansi(false).with_writer(writer).try_init(),
        None => builder.try_init(),
    };
    if installed.is_ok() {
        tracing::debug!(
            application = app_name,
            to_file = settings.directory.is_some(),
            "tracing ready"
        );
    }
}
