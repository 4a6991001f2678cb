mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./stickerforge.toml",
        "~/.config/stickerforge/config.toml",
        "/etc/stickerforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.tools.timeout_secs == 0 {
        anyhow::bail!("tools.timeout_secs must be at least 1");
    }

    for (name, path) in [
        ("ffmpeg", &config.tools.ffmpeg_path),
        ("ffprobe", &config.tools.ffprobe_path),
    ] {
        if let Some(path) = path {
            if !path.exists() {
                tracing::warn!("Configured {} path does not exist: {:?}", name, path);
            }
        }
    }

    let conversion = &config.conversion;
    if !(1..=100).contains(&conversion.jpeg_quality) {
        anyhow::bail!(
            "conversion.jpeg_quality must be between 1 and 100, got {}",
            conversion.jpeg_quality
        );
    }
    if !(2..=31).contains(&conversion.jpeg_qscale) {
        anyhow::bail!(
            "conversion.jpeg_qscale must be between 2 and 31, got {}",
            conversion.jpeg_qscale
        );
    }
    if conversion.max_concurrent == 0 {
        anyhow::bail!("conversion.max_concurrent must be at least 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("stickerforge.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[conversion]\njpeg_quality = 80\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.conversion.jpeg_quality, 80);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_config(Path::new("/nonexistent/stickerforge.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[conversion\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for body in [
            "[conversion]\njpeg_quality = 0\n",
            "[conversion]\njpeg_quality = 101\n",
            "[conversion]\njpeg_qscale = 1\n",
            "[conversion]\njpeg_qscale = 32\n",
            "[conversion]\nmax_concurrent = 0\n",
            "[tools]\ntimeout_secs = 0\n",
        ] {
            let path = write_config(dir.path(), body);
            assert!(load_config(&path).is_err(), "accepted: {body}");
        }
    }

    #[test]
    fn nonexistent_tool_path_is_only_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[tools]\nffmpeg_path = \"/nonexistent/ffmpeg\"\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.tools.ffmpeg_path, Some(PathBuf::from("/nonexistent/ffmpeg")));
    }

    #[test]
    fn explicit_path_wins_over_search() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[conversion]\nmax_concurrent = 2\n");
        let config = load_config_or_default(Some(&path)).unwrap();
        assert_eq!(config.conversion.max_concurrent, 2);
    }
}
