//! Job-board page understanding.
//!
//! - Listing URL construction per country and filter set (`search`)
//! - HTML extraction of job cards and wizard questions (`extract`)
//! - XPath affordances used to drive the application wizard (`locators`)
//!
//! Extraction never fails: missing or malformed elements degrade to empty
//! values, and inputs that cannot be classified come back as
//! [`applybot_common::InputModality::Unknown`].

pub mod extract;
pub mod locators;
pub mod search;

pub use extract::{
    extract_job_summaries, extract_question_blocks, has_next_page, is_obstructed, step_signature,
};
pub use locators::{SiteLocators, xpath_literal};
pub use search::{ListingQuery, host_prefix};
