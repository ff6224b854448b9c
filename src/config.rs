use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::question::QuizMode;
use crate::engine::selector::{DEFAULT_REVIEW_PROBABILITY, SelectorSettings};
use crate::store::json_store::default_data_dir;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_phrase_bank")]
    pub phrase_bank: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_review_probability")]
    pub review_probability: f64,
    #[serde(default = "default_enabled_modes")]
    pub enabled_modes: Vec<QuizMode>,
    #[serde(default = "default_speech_enabled")]
    pub speech_enabled: bool,
    #[serde(default = "default_tts_lang")]
    pub tts_lang: String,
    #[serde(default)]
    pub audio_player: Option<String>,
    #[serde(default)]
    pub record_command: Option<String>,
    #[serde(default)]
    pub transcribe_command: Option<String>,
}

fn default_phrase_bank() -> String {
    default_data_dir()
        .join("phrases.json")
        .to_string_lossy()
        .to_string()
}
fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_review_probability() -> f64 {
    DEFAULT_REVIEW_PROBABILITY
}
fn default_enabled_modes() -> Vec<QuizMode> {
    QuizMode::ALL.to_vec()
}
fn default_speech_enabled() -> bool {
    false
}
fn default_tts_lang() -> String {
    "en".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            phrase_bank: default_phrase_bank(),
            theme: default_theme(),
            review_probability: default_review_probability(),
            enabled_modes: default_enabled_modes(),
            speech_enabled: default_speech_enabled(),
            tts_lang: default_tts_lang(),
            audio_player: None,
            record_command: None,
            transcribe_command: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("phrasedrill")
            .join("config.toml")
    }

    /// Clamp out-of-range values after deserialization.
    pub fn validate(&mut self) {
        if !self.review_probability.is_finite() {
            self.review_probability = default_review_probability();
        }
        self.review_probability = self.review_probability.clamp(0.0, 1.0);

        let mut modes: Vec<QuizMode> = Vec::with_capacity(self.enabled_modes.len());
        for mode in &self.enabled_modes {
            if !modes.contains(mode) {
                modes.push(*mode);
            }
        }
        self.enabled_modes = if modes.is_empty() {
            default_enabled_modes()
        } else {
            modes
        };

        if self.tts_lang.trim().is_empty() {
            self.tts_lang = default_tts_lang();
        }
    }

    pub fn phrase_bank_path(&self) -> PathBuf {
        PathBuf::from(&self.phrase_bank)
    }

    pub fn selector_settings(&self) -> SelectorSettings {
        SelectorSettings {
            review_probability: self.review_probability,
            modes: self.enabled_modes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.review_probability, 0.7);
        assert_eq!(config.enabled_modes.len(), 5);
        assert!(!config.speech_enabled);
        assert_eq!(config.tts_lang, "en");
        assert!(config.phrase_bank.ends_with("phrases.json"));
        assert!(config.audio_player.is_none());
    }

    #[test]
    fn test_config_partial_file() {
        let toml_str = r#"
theme = "terminal-default"
enabled_modes = ["phrase", "choice"]
audio_player = "mpv --really-quiet"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.theme, "terminal-default");
        assert_eq!(config.enabled_modes, vec![QuizMode::Phrase, QuizMode::Choice]);
        assert_eq!(config.audio_player.as_deref(), Some("mpv --really-quiet"));
        assert_eq!(config.review_probability, 0.7);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.phrase_bank, deserialized.phrase_bank);
        assert_eq!(config.enabled_modes, deserialized.enabled_modes);
        assert_eq!(config.review_probability, deserialized.review_probability);
    }

    #[test]
    fn test_validate_clamps_values() {
        let mut config = Config::default();
        config.review_probability = 3.0;
        config.enabled_modes = Vec::new();
        config.tts_lang = "  ".to_string();
        config.validate();
        assert_eq!(config.review_probability, 1.0);
        assert_eq!(config.enabled_modes.len(), 5);
        assert_eq!(config.tts_lang, "en");

        config.review_probability = f64::NAN;
        config.validate();
        assert_eq!(config.review_probability, 0.7);
    }

    #[test]
    fn test_validate_dedupes_modes() {
        let mut config = Config::default();
        config.enabled_modes = vec![QuizMode::Phrase, QuizMode::Phrase, QuizMode::Speaking];
        config.validate();
        assert_eq!(config.enabled_modes, vec![QuizMode::Phrase, QuizMode::Speaking]);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let result: Result<Config, _> = toml::from_str(r#"enabled_modes = ["karaoke"]"#);
        assert!(result.is_err());
    }
}
