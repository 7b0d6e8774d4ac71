//! Configuration file loading and CLI/file/default merging.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use arxiv_latex_core::pipeline::{
    MAX_MAX_DEPTH, MIN_MAX_DEPTH, PipelineConfig, TIMEOUT_RANGE_SECS, default_cache_root,
};
use serde::Deserialize;

use crate::cli::Args;

/// TOML-backed file configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Cache root directory.
    pub cache_dir: Option<PathBuf>,
    /// Include nesting depth bound.
    pub max_depth: Option<usize>,
    /// E-print endpoint base URL.
    pub base_url: Option<String>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP request timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Remove image files after extraction.
    pub strip_images: Option<bool>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against the same ranges the CLI enforces.
    pub fn validate(&self) -> Result<()> {
        if let Some(depth) = self.max_depth
            && !(MIN_MAX_DEPTH..=MAX_MAX_DEPTH).contains(&depth)
        {
            bail!(
                "Invalid config value for `max_depth`: {depth}. Expected range: {MIN_MAX_DEPTH}..={MAX_MAX_DEPTH}"
            );
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !TIMEOUT_RANGE_SECS.contains(&value) {
        bail!(
            "Invalid config value for `{field}`: {value}. Expected range: {}..={}",
            TIMEOUT_RANGE_SECS.start(),
            TIMEOUT_RANGE_SECS.end()
        );
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/arxiv-latex/config.toml`
/// 2. `$HOME/.config/arxiv-latex/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("arxiv-latex")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("arxiv-latex")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}

/// Effective run settings after merging CLI flags over file values over
/// built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub pipeline: PipelineConfig,
    pub strip_images: bool,
}

/// Merges `args` over `file` over built-in defaults.
pub fn merge_settings(args: &Args, file: &FileConfig) -> Result<RunSettings> {
    let cache_root = args
        .cache_dir
        .clone()
        .or_else(|| file.cache_dir.clone())
        .or_else(default_cache_root)
        .ok_or_else(|| {
            anyhow!("Cannot determine a cache directory: set --cache-dir, XDG_CACHE_HOME or HOME")
        })?;

    let mut pipeline = PipelineConfig::new(cache_root);
    if let Some(depth) = args.max_depth {
        pipeline.max_depth = usize::from(depth);
    } else if let Some(depth) = file.max_depth {
        pipeline.max_depth = depth;
    }
    if let Some(base_url) = args.base_url.clone().or_else(|| file.base_url.clone()) {
        pipeline.base_url = base_url;
    }
    if let Some(secs) = file.connect_timeout_secs {
        pipeline.connect_timeout_secs = secs;
    }
    if let Some(secs) = file.read_timeout_secs {
        pipeline.read_timeout_secs = secs;
    }

    Ok(RunSettings {
        pipeline,
        strip_images: args.strip_images || file.strip_images.unwrap_or(false),
    })
}

/// Default log level: `-q` > `-v` count > config verbosity > `info`.
#[must_use]
pub fn resolve_default_log_level(args: &Args, file: Option<&FileConfig>) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbose {
        0 => {}
        1 => return "debug",
        _ => return "trace",
    }
    match file.and_then(|config| config.verbosity) {
        Some(VerbositySetting::Quiet) => "error",
        Some(VerbositySetting::Verbose) => "debug",
        Some(VerbositySetting::Debug) => "trace",
        Some(VerbositySetting::Default) | None => "info",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["arxiv-latex"];
        argv.extend_from_slice(extra);
        argv.push("2301.01234");
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(
            r#"
            cache_dir = "/data/arxiv"
            max_depth = 5
            verbosity = "verbose"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.cache_dir, Some(PathBuf::from("/data/arxiv")));
        assert_eq!(cfg.max_depth, Some(5));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
        assert!(cfg.base_url.is_none());
    }

    #[test]
    fn test_parse_config_supports_comments() {
        let cfg = parse_config_str("# header\nstrip_images = true # inline\n").unwrap();
        assert_eq!(cfg.strip_images, Some(true));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        assert!(parse_config_str("concurrency = 4").is_err());
    }

    #[test]
    fn test_parse_config_rejects_out_of_range_values() {
        assert!(parse_config_str("max_depth = 0").is_err());
        assert!(parse_config_str("max_depth = 65").is_err());
        assert!(parse_config_str("read_timeout_secs = 0").is_err());
        assert!(parse_config_str("connect_timeout_secs = 3601").is_err());
    }

    #[test]
    fn test_parse_config_rejects_invalid_verbosity() {
        assert!(parse_config_str("verbosity = \"loud\"").is_err());
    }

    #[test]
    fn test_load_file_config_reports_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "max_depth = \"deep\"").unwrap();

        let err = load_file_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn test_merge_cli_overrides_file() {
        let file = FileConfig {
            cache_dir: Some(PathBuf::from("/file/cache")),
            max_depth: Some(3),
            base_url: Some("http://file.example".to_string()),
            ..FileConfig::default()
        };
        let settings = merge_settings(
            &args(&["--cache-dir", "/cli/cache", "--max-depth", "7", "--base-url", "http://cli.example"]),
            &file,
        )
        .unwrap();

        assert_eq!(settings.pipeline.cache_root, PathBuf::from("/cli/cache"));
        assert_eq!(settings.pipeline.max_depth, 7);
        assert_eq!(settings.pipeline.base_url, "http://cli.example");
    }

    #[test]
    fn test_merge_file_overrides_defaults() {
        let file = FileConfig {
            cache_dir: Some(PathBuf::from("/file/cache")),
            max_depth: Some(3),
            read_timeout_secs: Some(60),
            strip_images: Some(true),
            ..FileConfig::default()
        };
        let settings = merge_settings(&args(&[]), &file).unwrap();

        assert_eq!(settings.pipeline.cache_root, PathBuf::from("/file/cache"));
        assert_eq!(settings.pipeline.max_depth, 3);
        assert_eq!(settings.pipeline.read_timeout_secs, 60);
        assert_eq!(settings.pipeline.connect_timeout_secs, 30);
        assert_eq!(settings.pipeline.base_url, "https://arxiv.org");
        assert!(settings.strip_images);
    }

    #[test]
    fn test_log_level_priority() {
        let quiet_file = FileConfig {
            verbosity: Some(VerbositySetting::Quiet),
            ..FileConfig::default()
        };
        assert_eq!(resolve_default_log_level(&args(&[]), None), "info");
        assert_eq!(resolve_default_log_level(&args(&[]), Some(&quiet_file)), "error");
        assert_eq!(resolve_default_log_level(&args(&["-v"]), Some(&quiet_file)), "debug");
        assert_eq!(resolve_default_log_level(&args(&["-vv"]), None), "trace");
        assert_eq!(resolve_default_log_level(&args(&["-q", "-v"]), None), "error");
    }
}
