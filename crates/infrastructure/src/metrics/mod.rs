//! Host readings for the optional `$stats/cputemp` and `$stats/cpuload` attributes.
//!
//! Both providers read Linux pseudo-files. A reading that cannot be taken is
//! reported as an empty string.

use domain::MetricProvider;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const THERMAL_ZONE_PATH: &str = "/sys/class/thermal/thermal_zone0/temp";
pub const LOADAVG_PATH: &str = "/proc/loadavg";

/// CPU temperature in degrees Celsius from a kernel thermal zone
#[derive(Debug, Clone)]
pub struct ThermalZoneTemperature {
    path: PathBuf,
}

impl Default for ThermalZoneTemperature {
    fn default() -> Self {
        Self::new()
    }
}

impl ThermalZoneTemperature {
    pub fn new() -> Self {
        Self::from_path(THERMAL_ZONE_PATH)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl MetricProvider for ThermalZoneTemperature {
    fn read(&self) -> String {
        read_with(&self.path, "CPU temperature", |raw| {
            parse_millidegrees(raw).map(|celsius| format!("{celsius:.1}"))
        })
    }
}

/// One-minute load average
#[derive(Debug, Clone)]
pub struct LoadAverage {
    path: PathBuf,
}

impl Default for LoadAverage {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadAverage {
    pub fn new() -> Self {
        Self::from_path(LOADAVG_PATH)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl MetricProvider for LoadAverage {
    fn read(&self) -> String {
        read_with(&self.path, "CPU load", |raw| {
            parse_one_minute_load(raw).map(|load| format!("{load:.2}"))
        })
    }
}

fn read_with(path: &Path, metric: &str, parse: impl Fn(&str) -> Option<String>) -> String {
    match std::fs::read_to_string(path) {
        Ok(raw) => parse(&raw).unwrap_or_else(|| {
            warn!(path = %path.display(), metric = metric, "Unparseable metric reading");
            String::new()
        }),
        Err(e) => {
            warn!(path = %path.display(), metric = metric, error = %e, "Failed to read metric");
            String::new()
        }
    }
}

/// Kernel thermal zones report millidegrees Celsius
pub fn parse_millidegrees(raw: &str) -> Option<f64> {
    raw.trim().parse::<i64>().ok().map(|milli| milli as f64 / 1000.0)
}

/// First field of `/proc/loadavg`
pub fn parse_one_minute_load(raw: &str) -> Option<f64> {
    raw.split_whitespace().next()?.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("homie-metric-{}", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_parse_millidegrees() {
        assert_eq!(parse_millidegrees("48312\n"), Some(48.312));
        assert_eq!(parse_millidegrees("-5000"), Some(-5.0));
        assert_eq!(parse_millidegrees("hot"), None);
    }

    #[test]
    fn test_parse_one_minute_load() {
        assert_eq!(
            parse_one_minute_load("0.52 0.58 0.59 1/467 12345\n"),
            Some(0.52)
        );
        assert_eq!(parse_one_minute_load(""), None);
    }

    #[test]
    fn test_thermal_zone_reading() {
        let path = temp_file("48312\n");
        assert_eq!(ThermalZoneTemperature::from_path(&path).read(), "48.3");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_average_reading() {
        let path = temp_file("1.5 0.58 0.59 1/467 12345\n");
        assert_eq!(LoadAverage::from_path(&path).read(), "1.50");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_source_reads_empty() {
        let missing = std::env::temp_dir().join(format!("homie-metric-{}", uuid::Uuid::new_v4()));
        assert_eq!(ThermalZoneTemperature::from_path(&missing).read(), "");
        assert_eq!(LoadAverage::from_path(&missing).read(), "");
    }
}
