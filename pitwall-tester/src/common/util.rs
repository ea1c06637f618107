use anyhow::{Context, Result};
use num_traits::cast::cast;
use pitwall_sim::RaceConfig;
use std::{fs, path::Path};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Convert a count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Load a race configuration file, or the defaults when no path is given.
pub fn load_race_config(path: Option<&Path>) -> Result<RaceConfig> {
    let Some(path) = path else {
        return Ok(RaceConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    RaceConfig::from_json(&raw).with_context(|| format!("invalid config {}", path.display()))
}
