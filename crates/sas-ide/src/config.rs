//! Analysis configuration loaded from `sas-analysis.toml`.

use std::path::{Path, PathBuf};

use sas_syntax::{EmbeddedLanguage, KnowledgeError, ParserOptions, StaticKeywordDatabase};
use serde::Deserialize;
use smol_str::SmolStr;
use thiserror::Error;
use tracing::warn;

pub(crate) const CONFIG_FILES: &[&str] = &["sas-analysis.toml", ".sas-analysis.toml"];

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// `[embedded] languages` names a language the scanner does not know.
    #[error("unknown embedded language `{0}`")]
    UnknownLanguage(String),
}

/// Analysis configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Config file path (if found).
    pub config_path: Option<PathBuf>,
    /// Comment prefix opening a custom region.
    pub region_start_marker: SmolStr,
    /// Comment prefix closing a custom region.
    pub region_end_marker: SmolStr,
    /// Languages whose `SUBMIT` blocks are scanned as embedded code.
    pub embedded_languages: Vec<EmbeddedLanguage>,
    /// Procedures where `RUN` does not close the block, on top of the
    /// built-in list.
    pub run_group_procedures: Vec<SmolStr>,
    /// JSON keyword catalog replacing the built-in one.
    pub knowledge_path: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let parser = ParserOptions::default();
        Self {
            config_path: None,
            region_start_marker: parser.region_start_marker,
            region_end_marker: parser.region_end_marker,
            embedded_languages: parser.scanner.embedded_languages,
            run_group_procedures: Vec::new(),
            knowledge_path: None,
        }
    }
}

impl AnalysisConfig {
    /// Loads the configuration of a project directory, falling back to the
    /// defaults when no file is found or the file is invalid.
    #[must_use]
    pub fn load(root: &Path) -> Self {
        let Some(path) = find_config_file(root) else {
            return Self::default();
        };
        Self::load_file(&path)
    }

    /// Loads a configuration file, falling back to the defaults on error.
    #[must_use]
    pub fn load_file(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(err) => {
                warn!("Failed to load sas-analysis config at {}: {err}", path.display());
                Self {
                    config_path: Some(path.to_path_buf()),
                    ..Self::default()
                }
            }
        }
    }

    /// Reads and parses a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml(&contents)?;
        if let (Some(knowledge), Some(dir)) = (&config.knowledge_path, path.parent()) {
            if knowledge.is_relative() {
                config.knowledge_path = Some(dir.join(knowledge));
            }
        }
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parses configuration text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let parsed: ConfigFile = toml::from_str(contents)?;
        let mut config = Self::default();

        if let Some(marker) = parsed.regions.start_marker {
            config.region_start_marker = marker.into();
        }
        if let Some(marker) = parsed.regions.end_marker {
            config.region_end_marker = marker.into();
        }
        if let Some(languages) = parsed.embedded.languages {
            config.embedded_languages = languages
                .iter()
                .map(|name| {
                    EmbeddedLanguage::from_procedure(&name.to_ascii_uppercase())
                        .ok_or_else(|| ConfigError::UnknownLanguage(name.clone()))
                })
                .collect::<Result<_, _>>()?;
        }
        config.run_group_procedures = parsed
            .parser
            .run_group_procedures
            .iter()
            .map(|name| SmolStr::new(name.to_ascii_uppercase()))
            .collect();
        config.knowledge_path = parsed.knowledge.path;
        Ok(config)
    }

    /// Parser options for this configuration.
    #[must_use]
    pub fn parser_options(&self) -> ParserOptions {
        let mut options = ParserOptions::default();
        options.scanner.embedded_languages = self.embedded_languages.clone();
        options.region_start_marker = self.region_start_marker.clone();
        options.region_end_marker = self.region_end_marker.clone();
        options
            .run_group_procedures
            .extend(self.run_group_procedures.iter().cloned());
        options
    }

    /// Loads the configured keyword catalog, if one is configured.
    pub fn knowledge_base(&self) -> Result<Option<StaticKeywordDatabase>, KnowledgeError> {
        self.knowledge_path
            .as_deref()
            .map(StaticKeywordDatabase::from_path)
            .transpose()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    regions: RegionsSection,
    #[serde(default)]
    embedded: EmbeddedSection,
    #[serde(default)]
    parser: ParserSection,
    #[serde(default)]
    knowledge: KnowledgeSection,
}

#[derive(Debug, Default, Deserialize)]
struct RegionsSection {
    start_marker: Option<String>,
    end_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddedSection {
    languages: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ParserSection {
    #[serde(default)]
    run_group_procedures: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct KnowledgeSection {
    path: Option<PathBuf>,
}

pub(crate) fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("{prefix}-{stamp}"));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn parses_every_section() {
        let config = AnalysisConfig::from_toml(
            r##"
[regions]
start_marker = "#region"
end_marker = "#endregion"

[embedded]
languages = ["python"]

[parser]
run_group_procedures = ["print"]

[knowledge]
path = "catalog.json"
"##,
        )
        .expect("valid config");
        assert_eq!(config.region_start_marker, "#region");
        assert_eq!(config.region_end_marker, "#endregion");
        assert_eq!(config.embedded_languages, vec![EmbeddedLanguage::Python]);
        assert_eq!(config.run_group_procedures, vec![SmolStr::new("PRINT")]);
        assert_eq!(config.knowledge_path, Some(PathBuf::from("catalog.json")));

        let options = config.parser_options();
        assert!(options.is_run_group("PRINT"));
        assert!(options.is_run_group("SQL"));
        assert_eq!(options.scanner.embedded_languages, vec![EmbeddedLanguage::Python]);
    }

    #[test]
    fn empty_config_matches_defaults() {
        let config = AnalysisConfig::from_toml("").expect("empty config");
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.parser_options(), ParserOptions::default());
    }

    #[test]
    fn unknown_language_is_an_error() {
        let err = AnalysisConfig::from_toml("[embedded]\nlanguages = [\"cobol\"]\n")
            .expect_err("unknown language");
        assert!(matches!(err, ConfigError::UnknownLanguage(name) if name == "cobol"));
    }

    #[test]
    fn load_finds_dotfile_and_resolves_catalog_path() {
        let root = temp_dir("sas-analysis-config");
        fs::write(
            root.join(".sas-analysis.toml"),
            "[knowledge]\npath = \"kb.json\"\n",
        )
        .expect("write config");
        let config = AnalysisConfig::load(&root);
        assert_eq!(config.config_path, Some(root.join(".sas-analysis.toml")));
        assert_eq!(config.knowledge_path, Some(root.join("kb.json")));
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let root = temp_dir("sas-analysis-invalid");
        let path = root.join("sas-analysis.toml");
        fs::write(&path, "[regions\nstart_marker = 1").expect("write config");
        let config = AnalysisConfig::load(&root);
        assert_eq!(config.config_path, Some(path));
        assert_eq!(config.region_start_marker, "region");
    }

    #[test]
    fn missing_directory_config_is_default() {
        let root = temp_dir("sas-analysis-missing");
        assert_eq!(AnalysisConfig::load(&root), AnalysisConfig::default());
    }
}
