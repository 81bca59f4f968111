//! Settings records handed to each layer.
//!
//! All of these deserialize from the `applybot.yaml` sections of the same
//! name and carry defaults so that a minimal file only names a profile and a
//! campaign.
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Browser automation stealth level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StealthLevel {
    Lightweight,
    #[default]
    Balanced,
    Maximum,
}

/// WebDriver session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Running WebDriver endpoint (chromedriver by default).
    pub webdriver_url: String,
    pub headless: bool,
    pub stealth_level: StealthLevel,
    /// Upper bound for a single WebDriver command.
    pub command_timeout_secs: u64,
    /// Upper bound for a page to change after a navigation click.
    pub page_change_timeout_secs: u64,
    /// Interval between polls of page state.
    pub poll_interval_ms: u64,
    /// How long to wait for a person to clear a bot-detection challenge.
    pub obstruction_wait_secs: u64,
    /// Randomized pause after each pointer action, in milliseconds.
    pub fidget_ms: (u64, u64),
    /// Randomized delay between keystrokes, in milliseconds.
    pub keystroke_ms: (u64, u64),
    pub retry: RetrySettings,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: false,
            stealth_level: StealthLevel::Balanced,
            command_timeout_secs: 30,
            page_change_timeout_secs: 10,
            poll_interval_ms: 250,
            obstruction_wait_secs: 600,
            fidget_ms: (500, 1500),
            keystroke_ms: (30, 250),
            retry: RetrySettings::default(),
        }
    }
}

impl BrowserSettings {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn page_change_timeout(&self) -> Duration {
        Duration::from_secs(self.page_change_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn obstruction_wait(&self) -> Duration {
        Duration::from_secs(self.obstruction_wait_secs)
    }
}

/// Bounded re-locate-and-retry budget for page interactions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 300,
            max_backoff_ms: 3_000,
        }
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(s: RetrySettings) -> Self {
        RetryPolicy::new(
            s.max_attempts,
            Duration::from_millis(s.initial_backoff_ms),
            Duration::from_millis(s.max_backoff_ms),
        )
    }
}

/// Limits for one run of the application wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardSettings {
    /// Hard ceiling on wizard steps before the attempt counts as stuck.
    pub max_steps: u32,
    /// Consecutive advance attempts that leave the page unchanged before the
    /// question phase is considered complete.
    pub max_stalled_advances: u32,
    /// How long to wait for the confirmation page after submitting.
    pub confirmation_timeout_secs: u64,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            max_steps: 25,
            max_stalled_advances: 2,
            confirmation_timeout_secs: 60,
        }
    }
}

impl WizardSettings {
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

/// Embedding provider used by the answer resolver.
///
/// Feature flags control which remote variants are compiled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum EmbeddingConfig {
    #[cfg(feature = "ollama")]
    Ollama {
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        model: String,
    },
    #[cfg(feature = "openai")]
    Openai {
        #[serde(default = "default_openai_endpoint")]
        endpoint: String,
        model: String,
        auth_token: String,
    },
    /// Deterministic in-process feature hashing, no model download.
    Hashing {
        #[serde(default = "default_hashing_dimensions")]
        dimensions: usize,
    },
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        #[cfg(feature = "ollama")]
        {
            Self::Ollama {
                endpoint: default_ollama_endpoint(),
                model: "nomic-embed-text".to_string(),
            }
        }
        #[cfg(not(feature = "ollama"))]
        {
            Self::Hashing {
                dimensions: default_hashing_dimensions(),
            }
        }
    }
}

#[cfg(feature = "ollama")]
fn default_ollama_endpoint() -> String {
    "http://localhost:11434".into()
}
#[cfg(feature = "openai")]
fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_hashing_dimensions() -> usize {
    384
}

/// Locations of the persisted state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Processed job ids, one per line.
    pub dedup_path: PathBuf,
    /// Submitted applications, one CSV row each.
    pub results_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dedup_path: PathBuf::from("cache.txt"),
            results_path: PathBuf::from("submissions.csv"),
        }
    }
}

/// The job board being driven.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    /// Registrable domain; country prefixes are prepended to it.
    pub domain: String,
    /// URL suffix of the page shown after a successful submission.
    pub confirmation_url_suffix: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            domain: "indeed.com".to_string(),
            confirmation_url_suffix: "post-apply".to_string(),
        }
    }
}

/// Seed table from which the knowledge base is expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeSeed {
    /// Question templates by category; `[BLANK]` is substituted per entry.
    pub templates: BTreeMap<String, Vec<String>>,
    /// Verbatim question → answer pairs that override template entries.
    pub answers: BTreeMap<String, String>,
}
