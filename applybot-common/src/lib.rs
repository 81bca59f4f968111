//! Common types and utilities shared across applybot crates.
//!
//! This crate defines the domain records that flow through the application
//! pipeline, the settings records handed to each layer, observability helpers,
//! the bounded retry combinator, and the shared error type. It is intentionally
//! lightweight so that every crate can depend on it.
//!
//! # Overview
//!
//! - [`JobSummary`], [`QuestionBlock`], [`InputModality`]: what extraction produces
//! - [`ApplicationResult`], [`Outcome`], [`FailureReason`]: what an attempt produces
//! - [`Campaign`], [`Region`], [`SearchFilters`]: the immutable run parameters
//! - [`Profile`]: operator answers used to seed the knowledge base
//! - [`BrowserSettings`], [`WizardSettings`], [`EmbeddingConfig`], ...: per-layer settings
//! - [`observability`]: centralised tracing/logging initialisation and the progress stream
//! - [`retry`]: bounded re-try combinator for transient faults
//! - [`ApplyError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! Deriving the per-pair quota of a campaign:
//!
//! ```rust
//! use applybot_common::{Campaign, Region};
//!
//! let campaign = Campaign {
//!     queries: vec!["a".into(), "b".into()],
//!     regions: vec![Region { location: "x".into(), country: "c".into() }],
//!     total_quota: 5,
//!     ..Campaign::default()
//! };
//! assert_eq!(campaign.per_pair_quota(), 3);
//! ```
pub mod observability;
pub mod retry;

mod settings;
mod types;

pub use settings::*;
pub use types::*;

/// Error types used across the applybot system.
#[derive(thiserror::Error, Debug)]
pub enum ApplyError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The browser session could not be started or was lost.
    #[error("Browser session error: {0}")]
    Session(String),

    /// The embedding provider failed to load or to embed.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The knowledge base holds no entries, so nothing can be answered.
    #[error("Knowledge base is empty")]
    NoKnowledge,

    /// A page interaction kept failing after its retry budget was spent.
    #[error("Interaction failed while {action}: {reason}")]
    Interaction { action: String, reason: String },

    /// An automated-access challenge was not cleared within the allowed wait.
    #[error("Page obstructed for more than {waited_secs}s: {url}")]
    Obstruction { url: String, waited_secs: u64 },

    /// Local persistence failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The results table could not be written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Operation exceeded its timeout.
    #[error("Timeout occurred")]
    Timeout,

    /// A driver reported an error that fits no other category.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),
}

impl ApplyError {
    /// Whether the error must abort the whole campaign rather than a single
    /// job or (query, region) pair.
    ///
    /// Resolver faults never reach the campaign boundary: the wizard turns
    /// them into a failed job. Provider start-up faults are raised before a
    /// campaign exists.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ApplyError::Session(_) | ApplyError::Io(_) | ApplyError::Csv(_)
        )
    }
}

/// Convenient alias for results that use [`ApplyError`].
pub type Result<T> = std::result::Result<T, ApplyError>;
