//! Application wizard state machine.
//!
//! One run drives a fresh tab through one posting's apply flow:
//!
//! ```text
//! Opened -> Questioning -> Reviewing -> Submitted -> Confirmed
//!    \___________\______________\___________\______> Failed
//! ```
//!
//! Every page interaction goes through the shared retry combinator. Faults
//! that survive it fail the job, never the campaign, unless the browser
//! session itself is gone. Whatever happens inside the run (including a
//! panic) the attempt tab is closed and the main tab is focused again before
//! [`ApplicationWizard::run`] returns.
use crate::resolver::AnswerResolver;
use applybot_common::retry::{RetryPolicy, retry};
use applybot_common::{
    ApplyError, BrowserSettings, FailureReason, InputModality, JobSummary, Outcome, QuestionBlock,
    Result, SiteSettings, WizardSettings,
};
use applybot_drivers::browser::wait::poll_until;
use applybot_drivers::{BrowserSession, InteractionError, TabHandle, Target};
use applybot_web::{SiteLocators, extract_question_blocks, step_signature};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardState {
    Opened,
    /// `step` counts distinct pages seen; `stalls` counts advance attempts
    /// on the current page that left it unchanged.
    Questioning { step: u32, stalls: u32 },
    Reviewing,
    Submitted,
    Confirmed,
    Failed(FailureReason),
}

pub struct ApplicationWizard {
    session: Arc<dyn BrowserSession>,
    resolver: Arc<AnswerResolver>,
    locators: SiteLocators,
    limits: WizardSettings,
    confirmation_suffix: String,
    page_change_timeout: Duration,
    poll_interval: Duration,
    retry: RetryPolicy,
}

impl ApplicationWizard {
    pub fn new(
        session: Arc<dyn BrowserSession>,
        resolver: Arc<AnswerResolver>,
        browser: &BrowserSettings,
        limits: WizardSettings,
        site: &SiteSettings,
    ) -> Self {
        Self {
            session,
            resolver,
            locators: SiteLocators::default(),
            limits,
            confirmation_suffix: site.confirmation_url_suffix.clone(),
            page_change_timeout: browser.page_change_timeout(),
            poll_interval: browser.poll_interval(),
            retry: browser.retry.into(),
        }
    }

    /// Drive `job` to a terminal outcome.
    ///
    /// Returns `Err` only for faults that must stop the campaign; every other
    /// problem is reported as [`Outcome::Failed`].
    pub async fn run(&self, job: &JobSummary) -> Result<Outcome> {
        let main = self
            .session
            .window()
            .await
            .map_err(|e| e.while_doing("reading the main tab"))?;

        let attempt = AssertUnwindSafe(self.attempt(job)).catch_unwind().await;
        let restored = self.restore(&main).await;

        let outcome = match attempt {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) if err.is_fatal() => return Err(err),
            Ok(Err(err)) => Outcome::Failed(FailureReason::Unexpected(err.to_string())),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(job_id = %job.id, panic = %message, "application attempt panicked");
                Outcome::Failed(FailureReason::Unexpected(message))
            }
        };
        restored?;

        match &outcome {
            Outcome::Submitted => info!(job_id = %job.id, title = %job.title, "application submitted"),
            Outcome::Failed(reason) => {
                warn!(job_id = %job.id, title = %job.title, reason = %reason, "application failed")
            }
            Outcome::Skipped(why) => debug!(job_id = %job.id, why = %why, "application skipped"),
        }
        Ok(outcome)
    }

    async fn attempt(&self, job: &JobSummary) -> Result<Outcome> {
        let mut state = WizardState::Opened;
        loop {
            debug!(job_id = %job.id, state = ?state, "wizard state");
            let next = match state {
                WizardState::Opened => self.open(job).await,
                WizardState::Questioning { step, stalls } => self.question(job, step, stalls).await,
                WizardState::Reviewing => self.review().await,
                WizardState::Submitted => self.await_confirmation().await,
                WizardState::Confirmed => return Ok(Outcome::Submitted),
                WizardState::Failed(reason) => return Ok(Outcome::Failed(reason)),
            };
            state = match next {
                Ok(next) => next,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => WizardState::Failed(FailureReason::Interaction(err.to_string())),
            };
        }
    }

    async fn open(&self, job: &JobSummary) -> Result<WizardState> {
        let session = self.session.as_ref();
        let url = job.detail_url.as_str();
        retry(&self.retry, "opening the posting", move || session.open_tab(url))
            .await
            .map_err(|e| e.while_doing("opening the posting"))?;

        if !self.appears(&self.locators.apply).await? {
            return Ok(WizardState::Failed(FailureReason::NoApplyButton));
        }
        let before = self.signature().await?;
        self.click(&self.locators.apply, "starting the application")
            .await
            .map_err(|e| e.while_doing("starting the application"))?;
        if !self.changed_from(&before).await? {
            return Ok(WizardState::Failed(FailureReason::NoApplyButton));
        }
        Ok(WizardState::Questioning { step: 1, stalls: 0 })
    }

    async fn question(&self, job: &JobSummary, step: u32, stalls: u32) -> Result<WizardState> {
        if step > self.limits.max_steps {
            return Ok(WizardState::Failed(FailureReason::Stuck));
        }

        let url = self.session.current_url().await.map_err(|e| e.while_doing("reading the step"))?;
        let html = self.session.source().await.map_err(|e| e.while_doing("reading the step"))?;
        let before = step_signature(&url, &html);

        for block in extract_question_blocks(&html) {
            if let Some(reason) = self.answer(job, &block).await? {
                return Ok(WizardState::Failed(reason));
            }
        }

        let advance = if self.present(&self.locators.apply_anyway).await? {
            &self.locators.apply_anyway
        } else if self.present(&self.locators.continue_step).await? {
            &self.locators.continue_step
        } else {
            debug!(job_id = %job.id, step, "no more question steps");
            return Ok(WizardState::Reviewing);
        };

        let moved = match self.click(advance, "advancing the wizard").await {
            Ok(()) => self.changed_from(&before).await?,
            Err(err) if err.is_session_lost() => return Err(err.while_doing("advancing the wizard")),
            Err(err) => {
                warn!(job_id = %job.id, step, error = %err, "advance failed");
                false
            }
        };

        if moved {
            return Ok(WizardState::Questioning { step: step + 1, stalls: 0 });
        }
        let stalls = stalls + 1;
        if stalls >= self.limits.max_stalled_advances {
            debug!(job_id = %job.id, step, stalls, "page no longer advances");
            Ok(WizardState::Reviewing)
        } else {
            Ok(WizardState::Questioning { step, stalls })
        }
    }

    /// Fill one question. `Some(reason)` means the job cannot continue.
    async fn answer(&self, job: &JobSummary, block: &QuestionBlock) -> Result<Option<FailureReason>> {
        let question = block.question_text.as_str();
        if block.modality == InputModality::Unknown {
            debug!(job_id = %job.id, question, "unsupported input; skipped");
            return Ok(None);
        }
        if block.prefilled.as_deref().is_some_and(|v| !v.trim().is_empty()) {
            return Ok(None);
        }
        let unanswerable = |why: &str| {
            if block.required {
                warn!(job_id = %job.id, question, why, "required question left unanswered");
                Some(FailureReason::Unanswerable(question.to_string()))
            } else {
                warn!(job_id = %job.id, question, why, "optional question left unanswered");
                None
            }
        };

        let Some(name) = block.field_name.as_deref() else {
            return Ok(unanswerable("field has no name"));
        };
        let answer = match self.resolver.resolve(question, &block.choices).await {
            Ok(answer) => answer,
            Err(err) => return Ok(unanswerable(&err.to_string())),
        };
        debug!(job_id = %job.id, question, answer = %answer, "resolved");

        let filled = match block.modality {
            InputModality::FreeText => self.type_into(&self.locators.text_input(name), &answer).await,
            InputModality::LongText => self.type_into(&self.locators.textarea(name), &answer).await,
            InputModality::SingleChoice => self.choose(&self.locators.choice(name, &answer)).await,
            InputModality::Select => self.choose(&self.locators.select_option(name, &answer)).await,
            InputModality::Unknown => Ok(()),
        };
        match filled {
            Ok(()) => Ok(None),
            Err(err) if err.is_session_lost() => Err(err.while_doing("answering a question")),
            Err(err) if block.required => {
                warn!(job_id = %job.id, question, error = %err, "could not fill required field");
                Ok(Some(FailureReason::Interaction(err.to_string())))
            }
            Err(err) => {
                warn!(job_id = %job.id, question, error = %err, "could not fill optional field");
                Ok(None)
            }
        }
    }

    async fn review(&self) -> Result<WizardState> {
        if self.present(&self.locators.review).await? {
            let before = self.signature().await?;
            match self.click(&self.locators.review, "opening the review").await {
                Ok(()) => {
                    self.changed_from(&before).await?;
                }
                Err(err) if err.is_session_lost() => return Err(err.while_doing("opening the review")),
                Err(err) => debug!(error = %err, "review affordance did not respond"),
            }
        }

        if self.appears(&self.locators.submit).await? {
            self.click(&self.locators.submit, "submitting")
                .await
                .map_err(|e| e.while_doing("submitting"))?;
        } else {
            debug!("no submit affordance; waiting for confirmation");
        }
        Ok(WizardState::Submitted)
    }

    async fn await_confirmation(&self) -> Result<WizardState> {
        let session = self.session.as_ref();
        let suffix = self.confirmation_suffix.as_str();
        let confirmed = poll_until(
            self.limits.confirmation_timeout(),
            self.poll_interval,
            move || async move {
                let url = session.current_url().await?;
                Ok::<_, InteractionError>(is_confirmation(&url, suffix).then_some(()))
            },
        )
        .await
        .map_err(|e| e.while_doing("waiting for confirmation"))?;

        Ok(match confirmed {
            Some(()) => WizardState::Confirmed,
            None => WizardState::Failed(FailureReason::NoConfirmation),
        })
    }

    /// Close every tab but `main` and focus `main`.
    ///
    /// Only a lost session or an unreachable main tab is an error; a tab that
    /// cannot be listed or closed is logged and left behind.
    async fn restore(&self, main: &TabHandle) -> Result<()> {
        let session = self.session.as_ref();
        let windows = match retry(&self.retry, "listing tabs", move || session.windows()).await {
            Ok(windows) => windows,
            Err(err) if err.is_session_lost() => return Err(err.while_doing("listing tabs")),
            Err(err) => {
                warn!(error = %err, "could not list tabs; attempt tab left open");
                Vec::new()
            }
        };
        for tab in windows.iter().filter(|t| *t != main) {
            let closed = match session.switch_to(tab).await {
                Ok(()) => session.close_tab().await,
                Err(err) => Err(err),
            };
            if let Err(err) = closed {
                if err.is_session_lost() {
                    return Err(err.while_doing("closing the attempt tab"));
                }
                warn!(tab = %tab, error = %err, "could not close attempt tab");
            }
        }
        retry(&self.retry, "returning to the main tab", move || session.switch_to(main))
            .await
            .map_err(|e| ApplyError::Session(format!("main tab unreachable: {e}")))
    }

    async fn click(&self, target: &Target, action: &str) -> std::result::Result<(), InteractionError> {
        let session = self.session.as_ref();
        retry(&self.retry, action, move || session.click(target)).await
    }

    async fn type_into(&self, target: &Target, text: &str) -> std::result::Result<(), InteractionError> {
        let session = self.session.as_ref();
        retry(&self.retry, "typing an answer", move || session.type_text(target, text)).await
    }

    /// Select a radio, checkbox or option unless it already is.
    async fn choose(&self, target: &Target) -> std::result::Result<(), InteractionError> {
        let session = self.session.as_ref();
        retry(&self.retry, "choosing an answer", move || async move {
            if !session.is_selected(target).await? {
                session.click(target).await?;
            }
            Ok::<(), InteractionError>(())
        })
        .await
    }

    async fn present(&self, target: &Target) -> Result<bool> {
        let session = self.session.as_ref();
        retry(&self.retry, "looking for an element", move || session.exists(target))
            .await
            .map_err(|e| e.while_doing("looking for an element"))
    }

    /// Wait up to the page-change timeout for `target` to exist.
    async fn appears(&self, target: &Target) -> Result<bool> {
        let session = self.session.as_ref();
        let found = poll_until(self.page_change_timeout, self.poll_interval, move || async move {
            Ok::<_, InteractionError>(session.exists(target).await?.then_some(()))
        })
        .await
        .map_err(|e| e.while_doing("waiting for an element"))?;
        Ok(found.is_some())
    }

    async fn signature(&self) -> Result<String> {
        current_signature(self.session.as_ref())
            .await
            .map_err(|e| e.while_doing("reading the page"))
    }

    /// Wait up to the page-change timeout for the page to differ from `before`.
    async fn changed_from(&self, before: &str) -> Result<bool> {
        let session = self.session.as_ref();
        let changed = poll_until(self.page_change_timeout, self.poll_interval, move || async move {
            let now = current_signature(session).await?;
            Ok::<_, InteractionError>((now != before).then_some(()))
        })
        .await
        .map_err(|e| e.while_doing("waiting for the page to change"))?;
        Ok(changed.is_some())
    }
}

async fn current_signature(session: &dyn BrowserSession) -> std::result::Result<String, InteractionError> {
    let url = session.current_url().await?;
    let html = session.source().await?;
    Ok(step_signature(&url, &html))
}

fn is_confirmation(url: &str, suffix: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.trim_end_matches('/').ends_with(suffix)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string())
}
