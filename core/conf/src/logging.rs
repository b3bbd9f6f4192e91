//! Build the process [`Logger`] from configuration.
use std::io::stdout;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use slog::o;
use slog::Drain;
use slog::IgnoreResult;
use slog::Level;
use slog::Logger;
use slog::Never;
use slog::OwnedKVList;
use slog::Record;
use slog::SendSyncRefUnwindSafeDrain;
use slog::SendSyncUnwindSafeDrain;
use slog_async::Async;
use slog_json::Json;

/// Logging configuration options.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LoggingConf {
    /// Flush logs asynchronously.
    #[serde(default = "LoggingConf::default_async", rename = "async")]
    pub async_flush: bool,

    /// Minimum level of events to emit.
    #[serde(default)]
    pub level: LoggingLevel,
}

impl Default for LoggingConf {
    fn default() -> Self {
        LoggingConf {
            async_flush: Self::default_async(),
            level: LoggingLevel::default(),
        }
    }
}

impl LoggingConf {
    fn default_async() -> bool {
        true
    }
}

/// Supported minimum logging levels.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Critical,
    Error,
    Warning,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LoggingLevel> for Level {
    fn from(value: LoggingLevel) -> Self {
        match value {
            LoggingLevel::Critical => Level::Critical,
            LoggingLevel::Error => Level::Error,
            LoggingLevel::Warning => Level::Warning,
            LoggingLevel::Info => Level::Info,
            LoggingLevel::Debug => Level::Debug,
            LoggingLevel::Trace => Level::Trace,
        }
    }
}

/// Filter events below a minimum level while keeping `Ok == ()`.
///
/// The [`slog::LevelFilter`] drain wraps `D::Ok` into an [`Option`],
/// which prevents it from being used as the root drain of a [`Logger`].
#[derive(Debug, Clone)]
struct LevelFilter<D: Drain>(D, Level);

impl<D: Drain<Ok = ()>> Drain for LevelFilter<D> {
    type Ok = ();
    type Err = D::Err;

    fn log(&self, record: &Record, values: &OwnedKVList) -> Result<Self::Ok, Self::Err> {
        if record.level().is_at_least(self.1) {
            self.0.log(record, values)?;
        }
        Ok(())
    }
}

fn into_logger<D>(drain: D) -> Logger
where
    D: SendSyncUnwindSafeDrain<Ok = (), Err = Never>,
    D: 'static + SendSyncRefUnwindSafeDrain<Err = Never, Ok = ()>,
{
    Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

/// Creates a [`Logger`] based on the given configuration.
pub fn configure(conf: &LoggingConf) -> Logger {
    let drain = Mutex::new(Json::default(stdout())).map(IgnoreResult::new);
    let drain = LevelFilter(drain, conf.level.into());
    match conf.async_flush {
        true => into_logger(Async::new(drain).build().ignore_res()),
        false => into_logger(drain),
    }
}

/// Creates a fixed [`Logger`] to be used until configuration is loaded.
pub fn starter() -> Logger {
    let drain = Mutex::new(Json::default(stdout())).map(IgnoreResult::new);
    into_logger(drain)
}
