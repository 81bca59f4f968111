//! Repeated passes over every (query, region) pair toward the total quota.
use crate::crawl::CrawlOrchestrator;
use crate::dedup::DedupStore;
use crate::ledger::ResultsLedger;
use applybot_common::observability::progress;
use applybot_common::{Campaign, Result};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// What a campaign achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignSummary {
    pub submitted: u32,
    pub failed: usize,
    pub skipped: usize,
    pub passes: u32,
    pub elapsed: Duration,
}

impl fmt::Display for CampaignSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Submitted {} application(s), {} failed, {} skipped in {} ({} pass(es))",
            self.submitted,
            self.failed,
            self.skipped,
            format_elapsed(self.elapsed),
            self.passes
        )
    }
}

/// `DD:HH:MM:SS`.
///
/// ```
/// use applybot_pipeline::campaign::format_elapsed;
/// use std::time::Duration;
///
/// assert_eq!(format_elapsed(Duration::from_secs(93_784)), "01:02:03:04");
/// assert_eq!(format_elapsed(Duration::from_millis(999)), "00:00:00:00");
/// ```
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}:{:02}",
        secs / 86_400,
        secs % 86_400 / 3_600,
        secs % 3_600 / 60,
        secs % 60
    )
}

pub struct CampaignDriver<'a> {
    orchestrator: &'a CrawlOrchestrator,
    campaign: &'a Campaign,
}

impl<'a> CampaignDriver<'a> {
    pub fn new(orchestrator: &'a CrawlOrchestrator, campaign: &'a Campaign) -> Self {
        Self {
            orchestrator,
            campaign,
        }
    }

    /// Run passes until the total quota is met, a pass submits nothing, or a
    /// stop is requested. The ledger is flushed after every pass.
    ///
    /// Pair-level faults are logged and the next pair is tried; only fatal
    /// faults end the campaign early, after a last flush.
    pub async fn run(
        &self,
        dedup: &mut DedupStore,
        ledger: &mut ResultsLedger,
    ) -> Result<CampaignSummary> {
        let started = Instant::now();
        let campaign = self.campaign;
        let total = campaign.total_quota;
        let per_pair = campaign.per_pair_quota();
        let stop = self.orchestrator.stop_token();
        let mut submitted = 0u32;
        let mut passes = 0u32;

        info!(
            total,
            per_pair,
            pairs = campaign.pair_count(),
            known_jobs = dedup.len(),
            "campaign started"
        );

        loop {
            passes += 1;
            let before = submitted;

            for (query, region) in campaign.pairs() {
                if stop.is_cancelled() || submitted >= total {
                    break;
                }
                let quota = per_pair.min(total - submitted);
                match self
                    .orchestrator
                    .run_pair(query, region, campaign, quota, dedup, ledger)
                    .await
                {
                    Ok(report) => submitted += report.submitted,
                    Err(err) if err.is_fatal() => {
                        if let Err(flush_err) = ledger.flush() {
                            warn!(error = %flush_err, "could not flush results");
                        }
                        return Err(err);
                    }
                    Err(err) => {
                        warn!(query, region = %region, error = %err, "pair abandoned");
                        progress(format!("Skipping \"{query}\" in {region}: {err}"));
                    }
                }
            }

            ledger.flush()?;
            progress(format!("Pass {passes} done: {submitted}/{total} submitted"));

            if submitted >= total || stop.is_cancelled() {
                break;
            }
            if submitted == before {
                info!(passes, submitted, "no new submissions in a full pass; stopping");
                break;
            }
        }

        let summary = CampaignSummary {
            submitted,
            failed: ledger.failed(),
            skipped: ledger.skipped(),
            passes,
            elapsed: started.elapsed(),
        };
        info!(
            submitted = summary.submitted,
            failed = summary.failed,
            skipped = summary.skipped,
            passes = summary.passes,
            "campaign finished"
        );
        Ok(summary)
    }
}
