use crate::alert::AlertKind;
use crate::timer::{DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub seed_demo_tasks: bool,
    pub timer: TimerConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub alert: AlertKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            seed_demo_tasks: true,
            timer: TimerConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            work_minutes: DEFAULT_WORK_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            alert: AlertKind::Bell,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".into(),
            file: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub explicit: bool,
}

/// Picks the config file: the one given on the command line, otherwise the
/// per-user config directory.
pub fn locate_config(explicit: Option<PathBuf>) -> Result<ConfigLocation> {
    if let Some(path) = explicit {
        return Ok(ConfigLocation {
            path,
            explicit: true,
        });
    }
    let dirs = project_dirs()?;
    Ok(ConfigLocation {
        path: dirs.config_dir().join("config.yml"),
        explicit: false,
    })
}

/// Missing file means defaults. A file that exists but does not parse is an
/// error.
pub fn load_config(location: &ConfigLocation) -> Result<Config> {
    if !location.path.exists() {
        return Ok(Config::default());
    }
    let data = fs::read_to_string(&location.path)
        .with_context(|| format!("reading {:?}", location.path))?;
    parse_config(&data).with_context(|| format!("parsing config file {:?}", location.path))
}

pub fn parse_config(data: &str) -> Result<Config> {
    if data.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(data)?;
    Ok(config)
}

/// Where the interactive UI writes its log.
pub fn log_file_path(config: &Config) -> Result<PathBuf> {
    if let Some(path) = &config.log.file {
        return Ok(path.clone());
    }
    let dirs = project_dirs()?;
    Ok(dirs.data_dir().join("taskdeck.log"))
}

pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    Ok(())
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "taskdeck").context("locating config directory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_input_is_default() {
        assert_eq!(parse_config("").unwrap(), Config::default());
        assert_eq!(parse_config("  \n").unwrap(), Config::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config = parse_config("timer:\n  work_minutes: 50\n").unwrap();
        assert_eq!(config.timer.work_minutes, 50);
        assert_eq!(config.timer.break_minutes, DEFAULT_BREAK_MINUTES);
        assert_eq!(config.timer.alert, AlertKind::Bell);
        assert!(config.seed_demo_tasks);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn full_config_round_trips_fields() {
        let yaml = "\
seed_demo_tasks: false
timer:
  work_minutes: 40
  break_minutes: 10
  alert: silent
log:
  level: debug
  file: /tmp/taskdeck-test.log
";
        let config = parse_config(yaml).unwrap();
        assert!(!config.seed_demo_tasks);
        assert_eq!(config.timer.break_minutes, 10);
        assert_eq!(config.timer.alert, AlertKind::Silent);
        assert_eq!(config.log.level, "debug");
        assert_eq!(
            log_file_path(&config).unwrap(),
            PathBuf::from("/tmp/taskdeck-test.log")
        );
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(parse_config("timer: [1, 2").is_err());
        assert!(parse_config("timer:\n  work_minutes: lots\n").is_err());
    }

    #[test]
    fn missing_explicit_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let location = locate_config(Some(dir.path().join("nope.yml"))).unwrap();
        assert!(location.explicit);
        assert_eq!(load_config(&location).unwrap(), Config::default());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "seed_demo_tasks: false").unwrap();
        let location = locate_config(Some(file.path().to_path_buf())).unwrap();
        let config = load_config(&location).unwrap();
        assert!(!config.seed_demo_tasks);
    }
}
