//! Driver layer for browser automation.
//!
//! This crate exposes the WebDriver session used to walk listing pages and
//! application wizards in a stealthy, reliable way.
//!
//! - [`browser::session::BrowserSession`]: the interaction seam the pipeline is written against
//! - [`browser::driver::ApplyDriver`]: WebDriver client wrapper implementing it
//! - [`browser::behavioral::BehavioralEngine`]: human‑like timings and typing
//! - [`browser::stealth`]: stealth launch arguments and JS evasions
//! - [`browser::error::InteractionError`]: classified interaction faults
//! - [`browser::wait::poll_until`]: bounded polling waits
pub mod browser;

pub use browser::error::InteractionError;
pub use browser::session::{BrowserSession, TabHandle, Target};
