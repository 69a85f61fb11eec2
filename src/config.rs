//! Runtime settings for the application.

use std::path::PathBuf;

use time::Date;
use tracing_subscriber::filter::LevelFilter;

use crate::{Error, timezone::local_today};

pub const DEFAULT_DB_PATH: &str = "expense_tracker.db";
pub const DEFAULT_TIMEZONE: &str = "Etc/UTC";
pub const DEFAULT_EXPORT_DIR: &str = "build/exports";

/// Where the data lives and how the application reports what it does.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// File path to the SQLite database.
    pub db_path: PathBuf,
    /// The canonical timezone name, e.g. "Pacific/Auckland", used to decide
    /// what "today" is.
    pub local_timezone: String,
    /// The directory that exports are written to.
    pub export_dir: PathBuf,
    pub log_level: LevelFilter,
    /// An optional file that receives debug logs.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            local_timezone: DEFAULT_TIMEZONE.to_owned(),
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            log_level: LevelFilter::INFO,
            log_file: None,
        }
    }
}

impl Config {
    /// Today's date in the configured timezone.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezone] if `local_timezone` is not a canonical
    /// timezone name.
    pub fn today(&self) -> Result<Date, Error> {
        local_today(&self.local_timezone)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::Error;

    use super::Config;

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!(config.db_path, PathBuf::from("expense_tracker.db"));
        assert_eq!(config.local_timezone, "Etc/UTC");
        assert_eq!(config.export_dir, PathBuf::from("build/exports"));
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn today_fails_for_unknown_timezone() {
        let config = Config {
            local_timezone: "Not/AZone".to_owned(),
            ..Default::default()
        };

        assert_eq!(
            config.today(),
            Err(Error::InvalidTimezone("Not/AZone".to_owned()))
        );
    }
}
