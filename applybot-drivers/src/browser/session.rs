use crate::browser::error::InteractionError;
use async_trait::async_trait;
use std::fmt;

/// Element locator understood by every [`BrowserSession`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    XPath(String),
    Css(String),
}

impl Target {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Target::XPath(expr.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Target::XPath(s) | Target::Css(s) => s,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::XPath(s) => write!(f, "xpath:{s}"),
            Target::Css(s) => write!(f, "css:{s}"),
        }
    }
}

/// Opaque browser tab identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TabHandle(pub String);

impl fmt::Display for TabHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One remote-controlled browser session.
///
/// All operations act on the currently focused tab. A session is not safe
/// for concurrent use from several call sites: callers drive it strictly in
/// sequence.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), InteractionError>;

    async fn current_url(&self) -> Result<String, InteractionError>;

    /// Full HTML of the focused tab.
    async fn source(&self) -> Result<String, InteractionError>;

    async fn window(&self) -> Result<TabHandle, InteractionError>;

    async fn windows(&self) -> Result<Vec<TabHandle>, InteractionError>;

    /// Open `url` in a new tab and focus it.
    async fn open_tab(&self, url: &str) -> Result<TabHandle, InteractionError>;

    /// Close the focused tab. Focus is undefined afterwards until
    /// [`BrowserSession::switch_to`] is called.
    async fn close_tab(&self) -> Result<(), InteractionError>;

    async fn switch_to(&self, tab: &TabHandle) -> Result<(), InteractionError>;

    async fn click(&self, target: &Target) -> Result<(), InteractionError>;

    /// Replace the value of a text field, typing character by character.
    async fn type_text(&self, target: &Target, text: &str) -> Result<(), InteractionError>;

    async fn is_selected(&self, target: &Target) -> Result<bool, InteractionError>;

    /// Whether at least one element matches, without waiting.
    async fn exists(&self, target: &Target) -> Result<bool, InteractionError>;
}
