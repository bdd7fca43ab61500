use super::LogSink;
use super::logrecord::{LogLevel, Logrecord};
use chrono::Local;
use colored::*;
use glob::glob;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
/// # Logger Local Options
///
/// Controls where and how `LoggerLocal` writes entries.
pub struct LoggerLocalOptions {
    /// Levels printed to the TTY (stdout).
    pub use_tty: Option<Vec<LogLevel>>,
    /// Levels appended to the log file.
    pub use_file: Option<Vec<LogLevel>>,
    /// Directory for log files. If `None`, defaults to the executable's directory.
    pub log_dir: Option<PathBuf>,
}

impl LoggerLocalOptions {
    /// TTY and file output for `min` and everything above it.
    pub fn tty_and_file(min: LogLevel, log_dir: Option<PathBuf>) -> Self {
        Self {
            use_tty: Some(LogLevel::at_least(min)),
            use_file: Some(LogLevel::at_least(min)),
            log_dir,
        }
    }

    /// TTY output only.
    pub fn tty_only(min: LogLevel) -> Self {
        Self {
            use_tty: Some(LogLevel::at_least(min)),
            use_file: None,
            log_dir: None,
        }
    }
}

/// # Logger Local
///
/// Writes colored lines to the terminal and JSON `Logrecord` lines to a
/// timestamped file that is rotated on startup.
pub struct LoggerLocal {
    /// The name of the application associated with this logger instance.
    app_name: String,
    /// Configuration options determining logging behavior.
    options: LoggerLocalOptions,
    /// The path to the currently active log file, if file logging is enabled.
    current_log_file: Option<PathBuf>,
    /// Serializes appends so concurrent lookups do not interleave lines.
    file_lock: Mutex<()>,
}

impl LoggerLocal {
    /// Keeps only the newest `{app_name}-*.log` file in `log_dir`.
    ///
    /// File names embed a sortable timestamp, so name order is age order.
    fn rotate_logs(app_name: &str, log_dir: &Path) {
        let pattern = format!("{}/{}-*.log", log_dir.display(), app_name);
        let entries = match glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("Invalid log rotation pattern {}: {}", pattern, e);
                return;
            }
        };

        let mut log_files: Vec<PathBuf> = entries.flatten().collect();
        log_files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

        for old_file in log_files.iter().skip(1) {
            if let Err(e) = std::fs::remove_file(old_file) {
                eprintln!("Error deleting old log file {}: {}", old_file.display(), e);
            }
        }
    }

    fn default_log_dir() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Creates a new `LoggerLocal` instance.
    ///
    /// If file logging is enabled, ensures the log directory exists, rotates
    /// old logs, and picks the current log file path.
    ///
    /// # Arguments
    /// * `app_name` - The name of the application using this logger.
    /// * `options` - Optional `LoggerLocalOptions`. If `None`, every level goes
    ///   to both TTY and file.
    pub fn new(app_name: String, options: Option<LoggerLocalOptions>) -> Self {
        let opts = options.unwrap_or_else(|| LoggerLocalOptions::tty_and_file(LogLevel::Silly, None));

        let mut logger = Self {
            app_name,
            options: opts,
            current_log_file: None,
            file_lock: Mutex::new(()),
        };

        if logger.options.use_file.is_some() {
            let log_base_dir = logger.options.log_dir.clone().unwrap_or_else(Self::default_log_dir);

            if let Err(e) = std::fs::create_dir_all(&log_base_dir) {
                eprintln!("Error creating log directory {}: {}", log_base_dir.display(), e);
            }

            Self::rotate_logs(&logger.app_name, &log_base_dir);

            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            let current_log_filename = format!("{}-{}.log", logger.app_name, timestamp);
            logger.current_log_file = Some(log_base_dir.join(current_log_filename));
        }

        logger
    }

    /// The file entries are appended to, if file logging is on.
    pub fn current_log_file(&self) -> Option<&Path> {
        self.current_log_file.as_deref()
    }

    fn print_tty(&self, record: &Logrecord) {
        let ts = record.rfc9557.as_str().truecolor(128, 128, 128);
        let app_name_colored = format!("[{}]", self.app_name).truecolor(128, 128, 128);
        let text = record.message.text.as_str();

        let colored_message = match record.loglevel {
            LogLevel::Fatal => text.bright_white().on_bright_red(),
            LogLevel::Error => text.bright_red(),
            LogLevel::Warn => text.bright_yellow(),
            LogLevel::Info => text.bright_green(),
            LogLevel::Debug => text.bright_white(),
            LogLevel::Trace => text.bright_cyan(),
            LogLevel::Silly => text.blue(),
        };

        println!("{}{}[{}] {}", ts, app_name_colored, record.loglevel, colored_message);
        if record.has_tags() {
            if let Ok(tags_str) = serde_json::to_string(&record.tags) {
                println!("{}{}{}", ts, app_name_colored, tags_str.truecolor(128, 128, 128));
            }
        }
    }

    fn append_file(&self, path: &Path, record: &Logrecord) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                eprintln!("Error serializing log record: {}", e);
                return;
            }
        };

        let _guard = self.file_lock.lock();
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "{}", line));
        if let Err(e) = written {
            eprintln!("Error writing log file {}: {}", path.display(), e);
        }
    }
}

impl LogSink for LoggerLocal {
    fn log(&self, level: LogLevel, message: &str, extras: Option<Value>) {
        let record = Logrecord::new(&self.app_name, level, message, extras);

        if self.options.use_tty.as_ref().is_some_and(|levels| levels.contains(&level)) {
            self.print_tty(&record);
        }

        if self.options.use_file.as_ref().is_some_and(|levels| levels.contains(&level)) {
            if let Some(path) = &self.current_log_file {
                self.append_file(path, &record);
            }
        }
    }
}
