//! The application pipeline.
//!
//! Leaf first:
//!
//! - [`knowledge`]: knowledge base expansion from profile and seed table
//! - [`resolver`]: embedding nearest-neighbour answers for screening questions
//! - [`salary`], [`filter`]: whether a posting is worth an attempt
//! - [`dedup`], [`ledger`]: processed ids and the results table
//! - [`wizard`]: one posting's application flow in its own tab
//! - [`crawl`]: one (query, region) pair, page by page
//! - [`campaign`]: passes over all pairs toward the total quota
//!
//! Everything runs in sequence against a single [`applybot_drivers::BrowserSession`].

pub mod campaign;
pub mod crawl;
pub mod dedup;
pub mod filter;
pub mod knowledge;
pub mod ledger;
pub mod resolver;
pub mod salary;
pub mod wizard;

pub use campaign::{CampaignDriver, CampaignSummary};
pub use crawl::{CrawlOrchestrator, PairReport};
pub use dedup::DedupStore;
pub use filter::{Rejection, SeenJobs, evaluate, passes};
pub use knowledge::KnowledgeBase;
pub use ledger::ResultsLedger;
pub use resolver::AnswerResolver;
pub use wizard::{ApplicationWizard, WizardState};
