use crate::browser::{
    behavioral::BehavioralEngine,
    error::InteractionError,
    fingerprint::{UserAgentManager, UserAgentProfile},
    session::{BrowserSession, TabHandle, Target},
    stealth::{build_stealth_arguments, evasions_for},
};
use applybot_common::{ApplyError, BrowserSettings, StealthLevel};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::wd::WindowHandle;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use webdriver::capabilities::Capabilities;

/// `fantoccini` WebDriver client with stealth and behavioral helpers.
///
/// Every command is bounded by the configured command timeout.
pub struct ApplyDriver {
    client: Client,
    behavioral_engine: BehavioralEngine,
    stealth_level: StealthLevel,
    profile: UserAgentProfile,
    command_timeout: Duration,
}

impl ApplyDriver {
    /// Start a session on the WebDriver service named in `settings`
    /// (chromedriver on `http://localhost:9515` by default).
    pub async fn connect(settings: &BrowserSettings) -> Result<Self, ApplyError> {
        let mut caps = Capabilities::new();
        let mut chrome_opts = HashMap::new();
        let mut user_agent_manager = UserAgentManager::new();
        let profile = user_agent_manager.session_profile().clone();

        let args = build_stealth_arguments(settings.stealth_level, &profile, settings.headless);
        chrome_opts.insert("args".to_string(), json!(args));
        chrome_opts.insert(
            "excludeSwitches".to_string(),
            json!(["enable-automation"]),
        );
        caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&settings.webdriver_url)
            .await
            .map_err(|e| {
                ApplyError::Session(format!(
                    "cannot start browser session at {}: {e}",
                    settings.webdriver_url
                ))
            })?;

        tracing::info!(
            webdriver = %settings.webdriver_url,
            headless = settings.headless,
            stealth = ?settings.stealth_level,
            "browser session started"
        );

        Ok(Self {
            client,
            behavioral_engine: BehavioralEngine::from_settings(settings),
            stealth_level: settings.stealth_level,
            profile,
            command_timeout: settings.command_timeout(),
        })
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<(), ApplyError> {
        self.client
            .close()
            .await
            .map_err(|e| ApplyError::Session(e.to_string()))
    }

    async fn bounded<T, Fut>(&self, action: &str, fut: Fut) -> Result<T, InteractionError>
    where
        Fut: Future<Output = Result<T, CmdError>>,
    {
        match tokio::time::timeout(self.command_timeout, fut).await {
            Ok(result) => result.map_err(InteractionError::from),
            Err(_) => Err(InteractionError::Timeout(format!(
                "{action} exceeded {:?}",
                self.command_timeout
            ))),
        }
    }

    async fn locate(&self, target: &Target) -> Result<Element, InteractionError> {
        let locator = match target {
            Target::XPath(x) => Locator::XPath(x),
            Target::Css(c) => Locator::Css(c),
        };
        self.bounded("locating element", self.client.find(locator))
            .await
            .map_err(|e| match e {
                InteractionError::NotFound(_) => InteractionError::NotFound(target.to_string()),
                other => other,
            })
    }

    async fn apply_stealth(&self) {
        for script in evasions_for(self.stealth_level, &self.profile) {
            if let Err(err) = self
                .bounded("applying evasions", self.client.execute(&script, vec![]))
                .await
            {
                tracing::debug!(error = %err, "stealth script rejected");
            }
        }
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<(), InteractionError> {
        let arg = serde_json::to_value(element)
            .map_err(|e| InteractionError::Script(e.to_string()))?;
        self.bounded(
            "scrolling into view",
            self.client.execute(
                "arguments[0].scrollIntoView({block: 'center', inline: 'nearest'});",
                vec![arg],
            ),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl BrowserSession for ApplyDriver {
    async fn goto(&self, url: &str) -> Result<(), InteractionError> {
        self.bounded("navigating", self.client.goto(url))
            .await
            .map_err(|e| match e {
                InteractionError::Timeout(m) | InteractionError::Script(m) => {
                    InteractionError::Navigation(format!("{url}: {m}"))
                }
                other => other,
            })?;
        self.apply_stealth().await;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, InteractionError> {
        self.bounded("reading url", self.client.current_url())
            .await
            .map(|u| u.to_string())
    }

    async fn source(&self) -> Result<String, InteractionError> {
        self.bounded("reading page source", self.client.source())
            .await
    }

    async fn window(&self) -> Result<TabHandle, InteractionError> {
        self.bounded("reading window handle", self.client.window())
            .await
            .map(|h| TabHandle(String::from(h)))
    }

    async fn windows(&self) -> Result<Vec<TabHandle>, InteractionError> {
        self.bounded("listing windows", self.client.windows())
            .await
            .map(|hs| hs.into_iter().map(|h| TabHandle(String::from(h))).collect())
    }

    async fn open_tab(&self, url: &str) -> Result<TabHandle, InteractionError> {
        let created = self
            .bounded("opening tab", self.client.new_window(true))
            .await?;
        let handle = created.handle;
        self.bounded("focusing new tab", self.client.switch_to_window(handle.clone()))
            .await?;
        self.goto(url).await?;
        Ok(TabHandle(String::from(handle)))
    }

    async fn close_tab(&self) -> Result<(), InteractionError> {
        self.bounded("closing tab", self.client.close_window())
            .await
    }

    async fn switch_to(&self, tab: &TabHandle) -> Result<(), InteractionError> {
        let handle = WindowHandle::try_from(tab.0.clone())
            .map_err(|e| InteractionError::Navigation(format!("bad window handle: {e}")))?;
        self.bounded("switching tab", self.client.switch_to_window(handle))
            .await
    }

    async fn click(&self, target: &Target) -> Result<(), InteractionError> {
        let element = self.locate(target).await?;
        self.scroll_into_view(&element).await?;
        self.behavioral_engine.fidget().await;
        self.bounded("clicking", element.click()).await
    }

    async fn type_text(&self, target: &Target, text: &str) -> Result<(), InteractionError> {
        let element = self.locate(target).await?;
        self.scroll_into_view(&element).await?;
        self.bounded("clearing field", element.clear()).await?;
        for ch in text.chars() {
            self.bounded("typing", element.send_keys(&ch.to_string()))
                .await?;
            self.behavioral_engine.keystroke_pause().await;
        }
        Ok(())
    }

    async fn is_selected(&self, target: &Target) -> Result<bool, InteractionError> {
        let element = self.locate(target).await?;
        self.bounded("reading selection", element.is_selected())
            .await
    }

    async fn exists(&self, target: &Target) -> Result<bool, InteractionError> {
        let locator = match target {
            Target::XPath(x) => Locator::XPath(x),
            Target::Css(c) => Locator::Css(c),
        };
        self.bounded("checking for element", self.client.find_all(locator))
            .await
            .map(|found| !found.is_empty())
    }
}
