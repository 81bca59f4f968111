#![allow(dead_code)]

use applybot_common::{BrowserSettings, RetrySettings, SiteSettings, WizardSettings};
use applybot_drivers::{BrowserSession, InteractionError, TabHandle, Target};
use applybot_embed::hashing::HashingEmbedder;
use applybot_pipeline::{AnswerResolver, ApplicationWizard, KnowledgeBase};
use applybot_web::SiteLocators;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub const MAIN_TAB: &str = "main";

#[derive(Default)]
struct State {
    tabs: Vec<(TabHandle, String)>,
    focus: Option<TabHandle>,
    pages: HashMap<String, String>,
    /// (page url, locator) -> where clicking it navigates, if anywhere.
    elements: HashMap<(String, String), Option<String>>,
    selected: HashSet<String>,
    clicks: Vec<String>,
    typed: Vec<(String, String)>,
    opened: Vec<String>,
    panic_on: Option<String>,
    session_lost: bool,
    next_tab: u32,
    /// Remaining `windows()` calls that fail with a timeout.
    windows_faults: u32,
    /// url -> (reads left before the swap, replacement html).
    swaps: HashMap<String, (u32, String)>,
}

/// Scripted in-memory browser: pages by url, clickable elements by
/// (url, locator), and a tab list.
pub struct FakeBrowser {
    state: Mutex<State>,
}

impl FakeBrowser {
    pub fn new(start_url: &str) -> Self {
        let main = TabHandle(MAIN_TAB.to_string());
        let state = State {
            tabs: vec![(main.clone(), start_url.to_string())],
            focus: Some(main),
            ..State::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn page(&self, url: &str, html: &str) {
        let mut s = self.state.lock().unwrap();
        s.pages.insert(url.to_string(), html.to_string());
    }

    pub fn element(&self, url: &str, target: &Target) {
        let mut s = self.state.lock().unwrap();
        s.elements
            .insert((url.to_string(), target.as_str().to_string()), None);
    }

    pub fn link(&self, url: &str, target: &Target, destination: &str) {
        let mut s = self.state.lock().unwrap();
        s.elements.insert(
            (url.to_string(), target.as_str().to_string()),
            Some(destination.to_string()),
        );
    }

    pub fn panic_on(&self, target: &Target) {
        self.state.lock().unwrap().panic_on = Some(target.as_str().to_string());
    }

    /// Fail the next `times` tab listings with a transient timeout.
    pub fn fail_windows(&self, times: u32) {
        self.state.lock().unwrap().windows_faults = times;
    }

    /// Serve the current page at `url` for `reads` more source reads, then `html`.
    pub fn swap_after(&self, url: &str, reads: u32, html: &str) {
        let mut s = self.state.lock().unwrap();
        s.swaps
            .insert(url.to_string(), (reads, html.to_string()));
    }

    pub fn lose_session(&self) {
        self.state.lock().unwrap().session_lost = true;
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().typed.clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.state.lock().unwrap().opened.clone()
    }

    pub fn tab_handles(&self) -> Vec<TabHandle> {
        let s = self.state.lock().unwrap();
        s.tabs.iter().map(|(h, _)| h.clone()).collect()
    }

    pub fn focused(&self) -> Option<TabHandle> {
        self.state.lock().unwrap().focus.clone()
    }

    pub fn url_of(&self, tab: &str) -> Option<String> {
        let s = self.state.lock().unwrap();
        s.tabs
            .iter()
            .find(|(h, _)| h.0 == tab)
            .map(|(_, url)| url.clone())
    }
}

impl State {
    fn check(&self) -> Result<(), InteractionError> {
        if self.session_lost {
            return Err(InteractionError::SessionLost("session deleted".into()));
        }
        Ok(())
    }

    fn focused_index(&self) -> Result<usize, InteractionError> {
        self.check()?;
        let focus = self
            .focus
            .as_ref()
            .ok_or_else(|| InteractionError::Navigation("no focused tab".into()))?;
        self.tabs
            .iter()
            .position(|(h, _)| h == focus)
            .ok_or_else(|| InteractionError::Navigation("focused tab closed".into()))
    }

    fn focused_url(&self) -> Result<String, InteractionError> {
        let i = self.focused_index()?;
        Ok(self.tabs[i].1.clone())
    }

    fn key(&self, target: &Target) -> Result<(String, String), InteractionError> {
        Ok((self.focused_url()?, target.as_str().to_string()))
    }
}

#[async_trait]
impl BrowserSession for FakeBrowser {
    async fn goto(&self, url: &str) -> Result<(), InteractionError> {
        let mut s = self.state.lock().unwrap();
        let i = s.focused_index()?;
        s.tabs[i].1 = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, InteractionError> {
        self.state.lock().unwrap().focused_url()
    }

    async fn source(&self) -> Result<String, InteractionError> {
        let mut s = self.state.lock().unwrap();
        let url = s.focused_url()?;
        let due = match s.swaps.get_mut(&url) {
            Some((0, _)) => true,
            Some((reads, _)) => {
                *reads -= 1;
                false
            }
            None => false,
        };
        if due {
            if let Some((_, html)) = s.swaps.remove(&url) {
                s.pages.insert(url.clone(), html);
            }
        }
        Ok(s.pages
            .get(&url)
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn window(&self) -> Result<TabHandle, InteractionError> {
        let s = self.state.lock().unwrap();
        let i = s.focused_index()?;
        Ok(s.tabs[i].0.clone())
    }

    async fn windows(&self) -> Result<Vec<TabHandle>, InteractionError> {
        let mut s = self.state.lock().unwrap();
        s.check()?;
        if s.windows_faults > 0 {
            s.windows_faults -= 1;
            return Err(InteractionError::Timeout("listing windows".into()));
        }
        Ok(s.tabs.iter().map(|(h, _)| h.clone()).collect())
    }

    async fn open_tab(&self, url: &str) -> Result<TabHandle, InteractionError> {
        let mut s = self.state.lock().unwrap();
        s.check()?;
        s.next_tab += 1;
        let handle = TabHandle(format!("tab-{}", s.next_tab));
        s.tabs.push((handle.clone(), url.to_string()));
        s.focus = Some(handle.clone());
        s.opened.push(url.to_string());
        Ok(handle)
    }

    async fn close_tab(&self) -> Result<(), InteractionError> {
        let mut s = self.state.lock().unwrap();
        let i = s.focused_index()?;
        s.tabs.remove(i);
        s.focus = None;
        Ok(())
    }

    async fn switch_to(&self, tab: &TabHandle) -> Result<(), InteractionError> {
        let mut s = self.state.lock().unwrap();
        s.check()?;
        if !s.tabs.iter().any(|(h, _)| h == tab) {
            return Err(InteractionError::Navigation(format!("no such window {tab}")));
        }
        s.focus = Some(tab.clone());
        Ok(())
    }

    async fn click(&self, target: &Target) -> Result<(), InteractionError> {
        let explode = {
            let s = self.state.lock().unwrap();
            s.panic_on.as_deref() == Some(target.as_str())
        };
        if explode {
            panic!("injected fault clicking {target}");
        }

        let mut s = self.state.lock().unwrap();
        let key = s.key(target)?;
        let destination = match s.elements.get(&key) {
            Some(dest) => dest.clone(),
            None => return Err(InteractionError::NotFound(target.to_string())),
        };
        s.clicks.push(key.1.clone());
        s.selected.insert(key.1);
        if let Some(dest) = destination {
            let i = s.focused_index()?;
            s.tabs[i].1 = dest;
        }
        Ok(())
    }

    async fn type_text(&self, target: &Target, text: &str) -> Result<(), InteractionError> {
        let mut s = self.state.lock().unwrap();
        let key = s.key(target)?;
        if !s.elements.contains_key(&key) {
            return Err(InteractionError::NotFound(target.to_string()));
        }
        s.typed.push((key.1, text.to_string()));
        Ok(())
    }

    async fn is_selected(&self, target: &Target) -> Result<bool, InteractionError> {
        let s = self.state.lock().unwrap();
        let key = s.key(target)?;
        if !s.elements.contains_key(&key) {
            return Err(InteractionError::NotFound(target.to_string()));
        }
        Ok(s.selected.contains(target.as_str()))
    }

    async fn exists(&self, target: &Target) -> Result<bool, InteractionError> {
        let s = self.state.lock().unwrap();
        let key = s.key(target)?;
        Ok(s.elements.contains_key(&key))
    }
}

pub fn browser_settings() -> BrowserSettings {
    BrowserSettings {
        page_change_timeout_secs: 0,
        poll_interval_ms: 1,
        obstruction_wait_secs: 0,
        retry: RetrySettings {
            max_attempts: 2,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        },
        ..BrowserSettings::default()
    }
}

pub fn wizard_settings() -> WizardSettings {
    WizardSettings {
        max_steps: 5,
        max_stalled_advances: 2,
        confirmation_timeout_secs: 0,
    }
}

pub fn resolver(entries: &[(&str, &str)]) -> Arc<AnswerResolver> {
    let kb: KnowledgeBase = entries.iter().copied().collect();
    Arc::new(AnswerResolver::new(
        kb,
        Arc::new(HashingEmbedder::new(512).unwrap()),
    ))
}

pub fn default_resolver() -> Arc<AnswerResolver> {
    resolver(&[
        ("How many years of Rust experience do you have?", "4"),
        ("Are you willing to relocate?", "No"),
        ("Do you have a valid driver's license?", "Yes"),
    ])
}

pub fn wizard(browser: &Arc<FakeBrowser>, resolver: Arc<AnswerResolver>) -> ApplicationWizard {
    ApplicationWizard::new(
        browser.clone(),
        resolver,
        &browser_settings(),
        wizard_settings(),
        &SiteSettings::default(),
    )
}

pub fn detail_url(id: &str) -> String {
    format!("https://www.indeed.com/viewjob?jk={id}")
}

pub fn step_url(id: &str, step: &str) -> String {
    format!("https://apply.test/{id}/{step}")
}

pub const QUESTION_STEP: &str = r#"
<html><body><h1>Questions from the employer</h1>
<div class="ia-Questions-item">
  <label for="q0"><span data-testid="rich-text">How many years of Rust experience do you have?</span></label>
  <input id="q0" type="number" name="q_years" required />
</div>
<div class="ia-Questions-item">
  <fieldset><legend>Would you be willing to relocate for this role?</legend>
    <label><input type="radio" name="q_reloc" value="1"/><span>Yes</span></label>
    <label><input type="radio" name="q_reloc" value="0"/><span>No</span></label>
  </fieldset>
</div>
</body></html>
"#;

/// Script a posting whose wizard asks one page of questions, shows a review
/// page, and lands on the confirmation page after submit.
pub fn script_job(browser: &FakeBrowser, id: &str) {
    let loc = SiteLocators::default();
    let detail = detail_url(id);
    let questions = step_url(id, "questions/1");
    let review = step_url(id, "review");
    let done = step_url(id, "post-apply");

    browser.page(
        &detail,
        "<html><body><h1>Rust Engineer</h1><button><span>Apply now</span></button></body></html>",
    );
    browser.link(&detail, &loc.apply, &questions);

    browser.page(&questions, QUESTION_STEP);
    browser.element(&questions, &loc.text_input("q_years"));
    browser.element(&questions, &loc.choice("q_reloc", "Yes"));
    browser.element(&questions, &loc.choice("q_reloc", "No"));
    browser.link(&questions, &loc.continue_step, &review);

    browser.page(
        &review,
        "<html><body><h1>Please review your application</h1></body></html>",
    );
    browser.link(&review, &loc.submit, &done);
    browser.page(
        &done,
        "<html><body><h1>Your application has been submitted!</h1></body></html>",
    );
}

/// A posting whose detail page has no apply affordance.
pub fn script_external_job(browser: &FakeBrowser, id: &str) {
    browser.page(
        &detail_url(id),
        "<html><body><h1>Apply on company site</h1></body></html>",
    );
}

pub fn card(id: &str, title: &str, company: &str, quick_apply: bool) -> String {
    let badge = if quick_apply {
        r#"<span class="ialbl">Easily apply</span>"#
    } else {
        ""
    };
    format!(
        r#"<div class="job_seen_beacon">
  <h2 class="jobTitle"><a data-jk="{id}"><span id="jobTitle-{id}">{title}</span></a></h2>
  <span data-testid="company-name">{company}</span>
  <div data-testid="text-location">Remote</div>
  {badge}
</div>"#
    )
}

pub fn listing(cards: &[String], next: Option<&str>) -> String {
    let nav = match next {
        Some(href) => format!(r#"<nav role="navigation"><a aria-label="Next Page" href="{href}">Next</a></nav>"#),
        None => String::new(),
    };
    format!(
        "<html><body><div class=\"mosaic\">{}</div>{nav}</body></html>",
        cards.join("\n")
    )
}
