use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

fn env_truthy(var: &str) -> Option<bool> {
    std::env::var(var).map(|v| v != "0" && !v.is_empty()).ok()
}

static PERF_ENABLED: Lazy<bool> = Lazy::new(|| env_truthy("NETGRIDVIZ_PERF").unwrap_or(false));

static STATS: Lazy<Mutex<HashMap<&'static str, PerfStat>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

#[derive(Default)]
struct PerfStat {
    total_ns: u128,
    max_ns: u128,
    count: u64,
    total_bytes: u128,
}

pub fn enabled() -> bool {
    *PERF_ENABLED
}

pub fn record_duration(label: &'static str, duration: Duration) {
    if !enabled() {
        return;
    }
    let mut stats = STATS.lock().unwrap();
    let entry = stats.entry(label).or_default();
    entry.count += 1;
    let nanos = duration.as_nanos();
    entry.total_ns += nanos;
    if nanos > entry.max_ns {
        entry.max_ns = nanos;
    }
    if entry.count % 200 == 0 {
        print_stat(label, entry);
    }
}

pub fn record_bytes(label: &'static str, bytes: usize) {
    if !enabled() {
        return;
    }
    let mut stats = STATS.lock().unwrap();
    let entry = stats.entry(label).or_default();
    entry.total_bytes += bytes as u128;
    entry.count += 1;
    if entry.count % 500 == 0 {
        print_stat(label, entry);
    }
}

fn print_stat(label: &'static str, stat: &PerfStat) {
    let avg_ns = if stat.count > 0 {
        stat.total_ns / stat.count as u128
    } else {
        0
    };
    let avg_us = avg_ns as f64 / 1_000.0;
    let max_us = stat.max_ns as f64 / 1_000.0;
    let kib = stat.total_bytes as f64 / 1024.0;
    eprintln!(
        "[perf] {label}: count={} avg={avg_us:.2}µs max={max_us:.2}µs bytes={kib:.2}KiB",
        stat.count
    );
}

/// RAII timer feeding [`record_duration`]. `None` when perf is disabled, so
/// the hot path pays one branch.
pub struct PerfGuard {
    label: &'static str,
    start: Instant,
}

impl PerfGuard {
    pub fn new(label: &'static str) -> Option<Self> {
        if !enabled() {
            return None;
        }
        Some(Self {
            label,
            start: Instant::now(),
        })
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        record_duration(self.label, self.start.elapsed());
    }
}

pub mod logging {
    use clap::ValueEnum;
    use std::fs::OpenOptions;
    use std::path::PathBuf;
    use std::sync::OnceLock;
    use tracing::level_filters::LevelFilter;
    use tracing_appender::non_blocking::WorkerGuard;
    use tracing_subscriber::EnvFilter;

    #[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
    pub enum LogLevel {
        Error,
        #[default]
        Warn,
        Info,
        Debug,
        Trace,
    }

    impl LogLevel {
        pub fn to_filter(self) -> LevelFilter {
            match self {
                LogLevel::Error => LevelFilter::ERROR,
                LogLevel::Warn => LevelFilter::WARN,
                LogLevel::Info => LevelFilter::INFO,
                LogLevel::Debug => LevelFilter::DEBUG,
                LogLevel::Trace => LevelFilter::TRACE,
            }
        }
    }

    #[derive(Clone, Debug, Default)]
    pub struct LogConfig {
        pub level: LogLevel,
        pub file: Option<PathBuf>,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum InitError {
        #[error("failed to open log file {path:?}: {source}")]
        Io {
            path: PathBuf,
            source: std::io::Error,
        },
        #[error("failed to configure logger: {0}")]
        Configure(String),
    }

    static INIT: OnceLock<()> = OnceLock::new();
    static GUARD: OnceLock<Option<WorkerGuard>> = OnceLock::new();

    /// Installs the global subscriber. A second call is a no-op so tests
    /// can init freely.
    pub fn init(config: &LogConfig) -> Result<(), InitError> {
        if INIT.get().is_some() {
            return Ok(());
        }
        inner_init(config)?;
        INIT.set(()).ok();
        Ok(())
    }

    fn inner_init(config: &LogConfig) -> Result<(), InitError> {
        let env_filter = build_env_filter(config.level.to_filter());

        let (writer, guard) = match &config.file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| InitError::Io {
                        path: path.clone(),
                        source,
                    })?;
                tracing_appender::non_blocking(file)
            }
            None => tracing_appender::non_blocking(std::io::stderr()),
        };

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_level(true)
            .with_target(config.level >= LogLevel::Debug)
            .with_ansi(config.file.is_none())
            .with_writer(writer)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|err| InitError::Configure(err.to_string()))?;

        let _ = GUARD.set(Some(guard));
        Ok(())
    }

    fn build_env_filter(level: LevelFilter) -> EnvFilter {
        if let Ok(filter) = std::env::var("NETGRIDVIZ_LOG_FILTER") {
            return EnvFilter::new(filter);
        }
        EnvFilter::new(default_filter_for(level))
    }

    fn default_filter_for(level: LevelFilter) -> &'static str {
        match level {
            LevelFilter::TRACE => "info,netgridviz=trace",
            LevelFilter::DEBUG => "info,netgridviz=debug",
            LevelFilter::INFO => "info",
            LevelFilter::WARN => "warn",
            LevelFilter::ERROR => "error",
            LevelFilter::OFF => "off",
        }
    }
}
