//! Crawl of one (query, region) pair.
use crate::dedup::DedupStore;
use crate::filter::{self, Rejection};
use crate::ledger::ResultsLedger;
use crate::wizard::ApplicationWizard;
use applybot_common::observability::progress;
use applybot_common::retry::{RetryPolicy, retry};
use applybot_common::{
    ApplicationResult, ApplyError, BrowserSettings, Campaign, Outcome, Region, Result,
};
use applybot_drivers::browser::wait::poll_until;
use applybot_drivers::{BrowserSession, InteractionError};
use applybot_web::{ListingQuery, SiteLocators, extract_job_summaries, has_next_page, is_obstructed};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Counts for one pair run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairReport {
    pub submitted: u32,
    pub failed: u32,
    pub skipped: u32,
    pub pages: u32,
}

pub struct CrawlOrchestrator {
    session: Arc<dyn BrowserSession>,
    wizard: ApplicationWizard,
    locators: SiteLocators,
    domain: String,
    stop: CancellationToken,
    retry: RetryPolicy,
    poll_interval: Duration,
    page_change_timeout: Duration,
    obstruction_wait: Duration,
}

impl CrawlOrchestrator {
    pub fn new(
        session: Arc<dyn BrowserSession>,
        wizard: ApplicationWizard,
        browser: &BrowserSettings,
        domain: impl Into<String>,
        stop: CancellationToken,
    ) -> Self {
        Self {
            session,
            wizard,
            locators: SiteLocators::default(),
            domain: domain.into(),
            stop,
            retry: browser.retry.into(),
            poll_interval: browser.poll_interval(),
            page_change_timeout: browser.page_change_timeout(),
            obstruction_wait: browser.obstruction_wait(),
        }
    }

    pub fn stop_token(&self) -> &CancellationToken {
        &self.stop
    }

    /// Walk the result pages of `query` in `region`, applying to every
    /// posting that passes the filters, until `quota` submissions, the last
    /// page, or a stop request.
    ///
    /// Every attempted posting is added to `dedup`, whatever its outcome.
    pub async fn run_pair(
        &self,
        query: &str,
        region: &Region,
        campaign: &Campaign,
        quota: u32,
        dedup: &mut DedupStore,
        ledger: &mut ResultsLedger,
    ) -> Result<PairReport> {
        let mut report = PairReport::default();
        if quota == 0 {
            return Ok(report);
        }

        let url = ListingQuery::new(query, region, &campaign.filters).url(&self.domain)?;
        info!(query, region = %region, quota, url = %url, "searching");
        progress(format!("Searching \"{query}\" in {region} (target {quota})"));
        let session = self.session.as_ref();
        let listing = url.as_str();
        retry(&self.retry, "loading the listing", move || session.goto(listing))
            .await
            .map_err(|e| e.while_doing("loading the listing"))?;

        'pages: loop {
            if self.stop.is_cancelled() {
                info!(query, region = %region, "stop requested");
                break;
            }
            report.pages += 1;
            let html = self.settled_page().await?;

            let jobs = extract_job_summaries(&html, &self.domain);
            debug!(page = report.pages, jobs = jobs.len(), "listing page read");

            for job in jobs {
                if report.submitted >= quota {
                    break 'pages;
                }
                match filter::evaluate(&job, campaign, &*dedup) {
                    Ok(()) => {}
                    // Recorded when it was first processed.
                    Err(Rejection::AlreadyProcessed) => {
                        debug!(job_id = %job.id, "already processed");
                        continue;
                    }
                    Err(rejection) => {
                        debug!(job_id = %job.id, title = %job.title, reason = %rejection, "filtered out");
                        ledger.record(ApplicationResult::new(&job, Outcome::Skipped(rejection.to_string())));
                        report.skipped += 1;
                        continue;
                    }
                }

                progress(format!("Applying: {} at {}", job.title, job.company));
                let outcome = self.wizard.run(&job).await?;
                if outcome.is_terminal_attempt() {
                    dedup.insert(&job.id)?;
                }
                match &outcome {
                    Outcome::Submitted => {
                        report.submitted += 1;
                        progress(format!(
                            "Submitted {}/{quota}: {} at {}",
                            report.submitted, job.title, job.company
                        ));
                    }
                    Outcome::Failed(reason) => {
                        report.failed += 1;
                        progress(format!("Failed: {} at {} ({reason})", job.title, job.company));
                    }
                    Outcome::Skipped(_) => report.skipped += 1,
                }
                ledger.record(ApplicationResult::new(&job, outcome));
            }

            if report.submitted >= quota || self.stop.is_cancelled() {
                break;
            }
            if !has_next_page(&html) {
                debug!(query, region = %region, pages = report.pages, "no further result pages");
                break;
            }
            if !self.next_page().await? {
                break;
            }
        }

        info!(
            query,
            region = %region,
            submitted = report.submitted,
            failed = report.failed,
            skipped = report.skipped,
            pages = report.pages,
            "pair finished"
        );
        Ok(report)
    }

    /// Source of the current listing page once no challenge is shown.
    ///
    /// A challenge suspends the crawl until someone clears it in the browser
    /// window, up to the obstruction wait.
    async fn settled_page(&self) -> Result<String> {
        let session = self.session.as_ref();
        let html = retry(&self.retry, "reading the listing", move || session.source())
            .await
            .map_err(|e| e.while_doing("reading the listing"))?;
        if !is_obstructed(&html) {
            return Ok(html);
        }

        let url = session.current_url().await.unwrap_or_default();
        warn!(url = %url, wait_secs = self.obstruction_wait.as_secs(), "bot check detected; waiting for it to be cleared");
        progress(format!(
            "Bot check detected. Clear it in the browser window within {}s to continue.",
            self.obstruction_wait.as_secs()
        ));
        let cleared = poll_until(self.obstruction_wait, self.poll_interval, move || async move {
            let html = session.source().await?;
            Ok::<_, InteractionError>((!is_obstructed(&html)).then_some(html))
        })
        .await
        .map_err(|e| e.while_doing("waiting for the bot check"))?;

        match cleared {
            Some(html) => {
                info!(url = %url, "bot check cleared; resuming");
                Ok(html)
            }
            None => Err(ApplyError::Obstruction {
                url,
                waited_secs: self.obstruction_wait.as_secs(),
            }),
        }
    }

    /// Follow the next-page link. `false` when the page did not move.
    async fn next_page(&self) -> Result<bool> {
        let session = self.session.as_ref();
        let before = session
            .current_url()
            .await
            .map_err(|e| e.while_doing("reading the listing url"))?;
        let target = &self.locators.next_page;
        match retry(&self.retry, "opening the next page", move || session.click(target)).await {
            Ok(()) => {}
            Err(err) if err.is_session_lost() => return Err(err.while_doing("opening the next page")),
            Err(err) => {
                warn!(error = %err, "next page link did not respond");
                return Ok(false);
            }
        }
        let before = before.as_str();
        let moved = poll_until(self.page_change_timeout, self.poll_interval, move || async move {
            let now = session.current_url().await?;
            Ok::<_, InteractionError>((now != before).then_some(()))
        })
        .await
        .map_err(|e| e.while_doing("waiting for the next page"))?;
        if moved.is_none() {
            warn!(url = %before, "next page did not load");
        }
        Ok(moved.is_some())
    }
}
