use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::config::ConfigLayer;

/// Reads a YAML config file. A missing file is an error; callers only pass
/// paths the user asked for.
pub fn load_config_file(path: &Path) -> Result<ConfigLayer> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {:?}", path))?;

    let file: ConfigLayer = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config YAML {:?}", path))?;

    Ok(file)
}

/// `managebac_report_<yyyymmdd_HHMMSS>.<ext>` in UTC.
pub fn report_file_name(generated_at: DateTime<Utc>, extension: &str) -> String {
    format!(
        "managebac_report_{}.{}",
        generated_at.format("%Y%m%d_%H%M%S"),
        extension
    )
}

/// Writes one rendered report, creating the output directory if needed.
pub fn save_report(
    output_dir: &Path,
    generated_at: DateTime<Utc>,
    extension: &str,
    content: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let path = output_dir.join(report_file_name(generated_at, extension));
    fs::write(&path, content).with_context(|| format!("Failed to write report to {:?}", path))?;
    Ok(path)
}
