//! Configuration file parsing and layering.
//!
//! Settings come from four layers, highest precedence first: CLI arguments,
//! `DS_*` environment variables, TOML config files, built-in defaults. Every
//! layer is reduced to a `SettingsLayer` of optional values; layers are merged
//! and then resolved once into `Settings`, which is validated before any
//! transport exists.

use crate::error::SweepError;
use crate::generate::Alphabet;
use crate::suffixes::DEFAULT_MAX_SUFFIX_LENGTH;
use crate::types::{SourceConfig, SourceKind, SweepConfig};
use crate::utils::{parse_bool, parse_duration, parse_fallback};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default candidate label length.
pub const DEFAULT_LENGTH: usize = 2;

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Pipeline tuning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep: Option<SweepSection>,

    /// Data source selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<SourcesSection>,

    /// Candidate generation defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SweepSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Retry passes after the first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<usize>,

    /// Per-request timeout (e.g. "10s", "500ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Delay held inside each permit after a check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SourcesSection {
    /// "whois", "json-api" or "raw-api"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,

    /// Same values as `primary`, or "none"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_binary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,

    /// Include digits in the default alphabet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digits: Option<bool>,

    /// Explicit alphabet; overrides `digits`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alphabet: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_suffix_length: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl FileConfig {
    /// Validate values and flatten into a settings layer.
    pub fn into_layer(self) -> Result<SettingsLayer, SweepError> {
        let mut layer = SettingsLayer::default();

        if let Some(sweep) = self.sweep {
            if let Some(concurrency) = sweep.concurrency {
                if concurrency == 0 || concurrency > 100 {
                    return Err(SweepError::config("Concurrency must be between 1 and 100"));
                }
                layer.concurrency = Some(concurrency);
            }
            layer.retries = sweep.retries;
            layer.timeout = sweep
                .timeout
                .as_deref()
                .map(|t| duration_setting("timeout", t))
                .transpose()?;
            layer.delay = sweep
                .delay
                .as_deref()
                .map(|d| duration_setting("delay", d))
                .transpose()?;
        }

        if let Some(sources) = self.sources {
            layer.primary = sources
                .primary
                .as_deref()
                .map(|p| p.parse::<SourceKind>().map_err(SweepError::config))
                .transpose()?;
            layer.fallback = sources
                .fallback
                .as_deref()
                .map(|f| parse_fallback(f).map_err(SweepError::config))
                .transpose()?;
            layer.primary_url = sources.primary_url;
            layer.fallback_url = sources.fallback_url;
            layer.whois_binary = sources.whois_binary;
            layer.api_key = sources.api_key;
        }

        if let Some(generation) = self.generation {
            layer.length = generation.length;
            layer.digits = generation.digits;
            layer.alphabet = generation.alphabet;
            layer.max_suffix_length = generation.max_suffix_length;
        }

        if let Some(output) = self.output {
            layer.output_dir = output.dir.map(PathBuf::from);
        }

        Ok(layer)
    }
}

fn duration_setting(name: &str, value: &str) -> Result<Duration, SweepError> {
    parse_duration(value).ok_or_else(|| {
        SweepError::config(format!(
            "Invalid {} format '{}'. Use format like '500ms', '10s', '2m'",
            name, value
        ))
    })
}

/// One configuration layer: every value optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsLayer {
    pub concurrency: Option<usize>,
    pub retries: Option<usize>,
    pub timeout: Option<Duration>,
    pub delay: Option<Duration>,
    pub primary: Option<SourceKind>,
    /// `Some(None)` disables the fallback
    pub fallback: Option<Option<SourceKind>>,
    pub primary_url: Option<String>,
    pub fallback_url: Option<String>,
    pub whois_binary: Option<String>,
    pub api_key: Option<String>,
    pub length: Option<usize>,
    pub digits: Option<bool>,
    pub alphabet: Option<String>,
    pub max_suffix_length: Option<usize>,
    pub output_dir: Option<PathBuf>,
}

impl SettingsLayer {
    /// Overlay `higher` on top of `self`; values set in `higher` win.
    pub fn merge(self, higher: SettingsLayer) -> SettingsLayer {
        SettingsLayer {
            concurrency: higher.concurrency.or(self.concurrency),
            retries: higher.retries.or(self.retries),
            timeout: higher.timeout.or(self.timeout),
            delay: higher.delay.or(self.delay),
            primary: higher.primary.or(self.primary),
            fallback: higher.fallback.or(self.fallback),
            primary_url: higher.primary_url.or(self.primary_url),
            fallback_url: higher.fallback_url.or(self.fallback_url),
            whois_binary: higher.whois_binary.or(self.whois_binary),
            api_key: higher.api_key.or(self.api_key),
            length: higher.length.or(self.length),
            digits: higher.digits.or(self.digits),
            alphabet: higher.alphabet.or(self.alphabet),
            max_suffix_length: higher.max_suffix_length.or(self.max_suffix_length),
            output_dir: higher.output_dir.or(self.output_dir),
        }
    }

    /// Fill in defaults and validate.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero length, a bad alphabet, or
    /// anything `SweepConfig::validate` rejects.
    pub fn resolve(self) -> Result<Settings, SweepError> {
        let defaults = SweepConfig::default();

        let primary_kind = self.primary.unwrap_or(defaults.primary.kind);
        let mut primary = SourceConfig::default_for(primary_kind);
        if let Some(url) = self.primary_url {
            primary.base_url = url;
        }

        let fallback_kind = match self.fallback {
            Some(choice) => choice,
            None => defaults.fallback.as_ref().map(|f| f.kind),
        };
        let fallback = fallback_kind.map(|kind| {
            let mut source = SourceConfig::default_for(kind);
            if let Some(url) = &self.fallback_url {
                source.base_url = url.clone();
            }
            source
        });

        let api_key = self.api_key;
        let primary = attach_key(primary, &api_key);
        let fallback = fallback.map(|source| attach_key(source, &api_key));

        let sweep = SweepConfig {
            concurrency: self.concurrency.unwrap_or(defaults.concurrency),
            retry_budget: self.retries.unwrap_or(defaults.retry_budget),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            request_delay: self.delay.unwrap_or(defaults.request_delay),
            primary,
            fallback,
            whois_binary: self.whois_binary.unwrap_or(defaults.whois_binary),
        };
        sweep.validate()?;

        let length = self.length.unwrap_or(DEFAULT_LENGTH);
        if length == 0 {
            return Err(SweepError::config("length must be at least 1"));
        }

        let alphabet = match self.alphabet {
            Some(chars) => Alphabet::custom(&chars)
                .map_err(|e| SweepError::config(format!("invalid alphabet: {}", e)))?,
            None => Alphabet::with_digits(self.digits.unwrap_or(true)),
        };

        Ok(Settings {
            sweep,
            length,
            alphabet,
            max_suffix_length: self.max_suffix_length.unwrap_or(DEFAULT_MAX_SUFFIX_LENGTH),
            output_dir: self
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        })
    }
}

fn attach_key(source: SourceConfig, api_key: &Option<String>) -> SourceConfig {
    if source.kind.is_http() {
        source.with_api_key(api_key.clone())
    } else {
        source
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub sweep: SweepConfig,
    pub length: usize,
    pub alphabet: Alphabet,
    pub max_suffix_length: usize,
    pub output_dir: PathBuf,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were found
    pub verbose: bool,
}

impl ConfigManager {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The parsed configuration or an error if the file is missing or
    /// malformed.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, SweepError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SweepError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            SweepError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file layer: the explicit file when given, otherwise every
    /// discovered file merged by precedence (XDG, then home, then local).
    pub fn load_layer(&self, explicit: Option<&Path>) -> Result<SettingsLayer, SweepError> {
        if let Some(path) = explicit {
            return self.load_file(path)?.into_layer();
        }

        let mut merged = SettingsLayer::default();
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            let layer = self.load_file(&path)?.into_layer()?;
            if self.verbose {
                tracing::info!(path = %path.display(), "loaded config file");
            }
            merged = merged.merge(layer);
        }

        Ok(merged)
    }

    /// Looks for configuration files in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./domain-sweep.toml", "./.domain-sweep.toml"]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Looks for configuration files in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".domain-sweep.toml", "domain-sweep.toml"]
            .iter()
            .map(|name| Path::new(&home).join(name))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-sweep").join("config.toml");
        path.exists().then_some(path)
    }
}

/// Load the `DS_*` environment layer.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> SettingsLayer {
    env_layer_from(|key| env::var(key).ok())
}

/// The explicit config file named by `DS_CONFIG`, if any.
pub fn env_config_path() -> Option<PathBuf> {
    env::var_os("DS_CONFIG").map(PathBuf::from)
}

/// Build the environment layer from an arbitrary variable lookup.
pub fn env_layer_from<F>(lookup: F) -> SettingsLayer
where
    F: Fn(&str) -> Option<String>,
{
    fn read<T, P>(lookup: &dyn Fn(&str) -> Option<String>, key: &str, parse: P) -> Option<T>
    where
        P: Fn(&str) -> Option<T>,
    {
        let raw = lookup(key)?;
        let parsed = parse(&raw);
        if parsed.is_none() {
            tracing::warn!(variable = key, value = %raw, "ignoring invalid environment value");
        }
        parsed
    }

    fn non_blank(value: &str) -> Option<String> {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    let lookup: &dyn Fn(&str) -> Option<String> = &lookup;

    SettingsLayer {
        concurrency: read(lookup, "DS_CONCURRENCY", |v| {
            v.trim().parse::<usize>().ok().filter(|c| (1..=100).contains(c))
        }),
        retries: read(lookup, "DS_RETRIES", |v| v.trim().parse().ok()),
        timeout: read(lookup, "DS_TIMEOUT", |v| {
            parse_duration(v).filter(|d| !d.is_zero())
        }),
        delay: read(lookup, "DS_DELAY", parse_duration),
        primary: read(lookup, "DS_PRIMARY", |v| v.parse().ok()),
        fallback: read(lookup, "DS_FALLBACK", |v| parse_fallback(v).ok()),
        primary_url: read(lookup, "DS_PRIMARY_URL", non_blank),
        fallback_url: read(lookup, "DS_FALLBACK_URL", non_blank),
        whois_binary: read(lookup, "DS_WHOIS_BIN", non_blank),
        api_key: read(lookup, "DS_API_KEY", non_blank),
        length: read(lookup, "DS_LENGTH", |v| {
            v.trim().parse::<usize>().ok().filter(|l| *l > 0)
        }),
        digits: read(lookup, "DS_DIGITS", parse_bool),
        alphabet: None,
        max_suffix_length: None,
        output_dir: read(lookup, "DS_OUTPUT", non_blank).map(PathBuf::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(
            r#"
[sweep]
concurrency = 50
retries = 3
timeout = "5s"
delay = "250ms"

[sources]
primary = "whois"
fallback = "none"
whois_binary = "/usr/bin/whois"

[generation]
length = 3
digits = false

[output]
dir = "results"
"#,
        );

        let manager = ConfigManager::new(false);
        let layer = manager.load_layer(Some(file.path())).unwrap();

        assert_eq!(layer.concurrency, Some(50));
        assert_eq!(layer.retries, Some(3));
        assert_eq!(layer.timeout, Some(Duration::from_secs(5)));
        assert_eq!(layer.delay, Some(Duration::from_millis(250)));
        assert_eq!(layer.primary, Some(SourceKind::Whois));
        assert_eq!(layer.fallback, Some(None));
        assert_eq!(layer.length, Some(3));
        assert_eq!(layer.output_dir, Some(PathBuf::from("results")));

        let settings = layer.resolve().unwrap();
        assert_eq!(settings.sweep.primary.kind, SourceKind::Whois);
        assert!(settings.sweep.fallback.is_none());
        assert_eq!(settings.sweep.whois_binary, "/usr/bin/whois");
        assert_eq!(settings.alphabet, Alphabet::letters());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let manager = ConfigManager::new(false);

        let file = write_config("[sweep]\nconcurrency = 0\n");
        assert!(manager.load_layer(Some(file.path())).is_err());

        let file = write_config("[sweep]\ntimeout = \"soon\"\n");
        assert!(manager.load_layer(Some(file.path())).is_err());

        let file = write_config("[sources]\nprimary = \"rdap\"\n");
        assert!(manager.load_layer(Some(file.path())).is_err());

        let file = write_config("[sweep\n");
        let err = manager.load_layer(Some(file.path())).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_missing_explicit_file() {
        let manager = ConfigManager::new(false);
        let err = manager
            .load_layer(Some(Path::new("/nonexistent/domain-sweep.toml")))
            .unwrap_err();
        assert!(matches!(err, SweepError::FileError { .. }));
    }

    #[test]
    fn test_merge_higher_wins() {
        let lower = SettingsLayer {
            concurrency: Some(10),
            retries: Some(5),
            fallback: Some(None),
            ..Default::default()
        };
        let higher = SettingsLayer {
            concurrency: Some(25),
            ..Default::default()
        };

        let merged = lower.merge(higher);
        assert_eq!(merged.concurrency, Some(25));
        assert_eq!(merged.retries, Some(5));
        assert_eq!(merged.fallback, Some(None));
    }

    #[test]
    fn test_resolve_defaults() {
        let settings = SettingsLayer::default().resolve().unwrap();
        assert_eq!(settings.sweep, SweepConfig::default());
        assert_eq!(settings.length, DEFAULT_LENGTH);
        assert_eq!(settings.alphabet, Alphabet::default());
        assert_eq!(settings.max_suffix_length, DEFAULT_MAX_SUFFIX_LENGTH);
        assert_eq!(settings.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_resolve_urls_and_key() {
        let settings = SettingsLayer {
            primary_url: Some("http://localhost:8080/whois".to_string()),
            fallback: Some(Some(SourceKind::JsonApi)),
            fallback_url: Some("http://localhost:9090/whois".to_string()),
            api_key: Some("k".to_string()),
            ..Default::default()
        }
        .resolve()
        .unwrap();

        assert_eq!(settings.sweep.primary.base_url, "http://localhost:8080/whois");
        assert_eq!(settings.sweep.primary.api_key.as_deref(), Some("k"));
        let fallback = settings.sweep.fallback.unwrap();
        assert_eq!(fallback.kind, SourceKind::JsonApi);
        assert_eq!(fallback.base_url, "http://localhost:9090/whois");
    }

    #[test]
    fn test_resolve_rejects_preconditions() {
        let blank_key = SettingsLayer {
            api_key: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(blank_key.resolve().unwrap_err().is_config_error());

        let zero_length = SettingsLayer {
            length: Some(0),
            ..Default::default()
        };
        assert!(zero_length.resolve().is_err());

        let bad_alphabet = SettingsLayer {
            alphabet: Some("a.b".to_string()),
            ..Default::default()
        };
        assert!(bad_alphabet.resolve().is_err());
    }

    #[test]
    fn test_env_layer() {
        let vars: HashMap<&str, &str> = [
            ("DS_CONCURRENCY", "8"),
            ("DS_RETRIES", "4"),
            ("DS_TIMEOUT", "3s"),
            ("DS_FALLBACK", "none"),
            ("DS_PRIMARY", "raw-api"),
            ("DS_DIGITS", "no"),
            ("DS_OUTPUT", "out"),
        ]
        .into_iter()
        .collect();

        let layer = env_layer_from(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(layer.concurrency, Some(8));
        assert_eq!(layer.retries, Some(4));
        assert_eq!(layer.timeout, Some(Duration::from_secs(3)));
        assert_eq!(layer.fallback, Some(None));
        assert_eq!(layer.primary, Some(SourceKind::RawApi));
        assert_eq!(layer.digits, Some(false));
        assert_eq!(layer.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_env_layer_ignores_invalid() {
        let vars: HashMap<&str, &str> = [
            ("DS_CONCURRENCY", "0"),
            ("DS_TIMEOUT", "forever"),
            ("DS_PRIMARY", "rdap"),
            ("DS_API_KEY", "   "),
        ]
        .into_iter()
        .collect();

        let layer = env_layer_from(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(layer, SettingsLayer::default());
    }
}
