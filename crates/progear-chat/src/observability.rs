//! Process-wide `tracing` setup for binaries built on this crate.
//!
//! Settings come from `PROGEAR_*` variables: `PROGEAR_LOG` turns logging off
//! with `off`/`0`/`false`, `PROGEAR_LOG_LEVEL` (else `RUST_LOG`) picks the
//! filter, and `PROGEAR_LOG_FILE` sends JSON lines to a file instead of
//! stderr.
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INSTALLED: OnceCell<()> = OnceCell::new();

const DEFAULT_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
enum LogSink {
    Stderr,
    JsonFile(PathBuf),
}

#[derive(Debug)]
struct LogSettings {
    enabled: bool,
    filter: EnvFilter,
    sink: LogSink,
}

impl LogSettings {
    fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = !lookup("PROGEAR_LOG").is_some_and(|v| is_off(&v));
        let filter = ["PROGEAR_LOG_LEVEL", "RUST_LOG"]
            .into_iter()
            .filter_map(&lookup)
            .find_map(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));
        let sink = match lookup("PROGEAR_LOG_FILE").filter(|p| !p.trim().is_empty()) {
            Some(path) => LogSink::JsonFile(PathBuf::from(path.trim())),
            None => LogSink::Stderr,
        };
        Self {
            enabled,
            filter,
            sink,
        }
    }

    fn install(self) {
        if !self.enabled {
            return;
        }
        let registry = tracing_subscriber::registry().with(self.filter);
        let installed = match self.sink {
            LogSink::Stderr => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .try_init(),
            LogSink::JsonFile(path) => {
                let (dir, file) = split_log_path(&path);
                if let Err(err) = std::fs::create_dir_all(dir) {
                    eprintln!("cannot create log directory {}: {err}", dir.display());
                    return;
                }
                registry
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_current_span(true)
                            .with_span_list(true)
                            .with_writer(tracing_appender::rolling::never(dir, file)),
                    )
                    .try_init()
            }
        };
        // Another subscriber may already own the process; keep it.
        let _ = installed;
    }
}

fn is_off(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "off" | "false" | "no"
    )
}

fn split_log_path(path: &Path) -> (&Path, &std::ffi::OsStr) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file = path
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("progear.jsonl"));
    (dir, file)
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_observability() {
    INSTALLED.get_or_init(|| LogSettings::resolve(|key| std::env::var(key).ok()).install());
}
