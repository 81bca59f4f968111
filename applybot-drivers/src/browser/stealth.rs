//! Launch flags and page-load scripts that keep the session from advertising
//! itself as automated. Everything is derived from the per-session
//! [`UserAgentProfile`] so the flags, the user agent and the spoofed
//! navigator values agree with each other.
use super::fingerprint::UserAgentProfile;
use applybot_common::StealthLevel;

const HIDE_WEBDRIVER: &str = "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });\
if (!window.chrome) { window.chrome = { runtime: {} }; }";

const GPU_VENDOR: &str = r#"
(() => {
  const original = WebGLRenderingContext.prototype.getParameter;
  WebGLRenderingContext.prototype.getParameter = function (p) {
    if (p === 37445) return 'Google Inc.';
    if (p === 37446) return 'ANGLE (Intel, Intel(R) UHD Graphics, OpenGL 4.1)';
    return original.call(this, p);
  };
})();
"#;

/// Chrome command-line arguments for one session.
pub fn build_stealth_arguments(
    level: StealthLevel,
    profile: &UserAgentProfile,
    headless: bool,
) -> Vec<String> {
    let (width, height) = profile.viewport;
    let mut args: Vec<String> = [
        "--disable-blink-features=AutomationControlled",
        "--disable-infobars",
        "--disable-dev-shm-usage",
        // The wizard opens postings in new tabs.
        "--disable-popup-blocking",
        "--no-first-run",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(format!("--user-agent={}", profile.user_agent));
    args.push(format!("--window-size={width},{height}"));
    args.push(format!("--lang={}", profile.languages.join(",")));

    if headless {
        args.push("--headless=new".into());
        args.push("--disable-gpu".into());
    } else if level == StealthLevel::Maximum {
        args.push("--disable-gpu".into());
    }
    args
}

/// Scripts evaluated after each navigation.
pub fn evasions_for(level: StealthLevel, profile: &UserAgentProfile) -> Vec<String> {
    let mut scripts = vec![HIDE_WEBDRIVER.to_string()];
    if level == StealthLevel::Lightweight {
        return scripts;
    }
    scripts.push(override_getter("languages", &js_array(&profile.languages)));
    if level == StealthLevel::Maximum {
        scripts.push(override_getter("platform", &js_string(&profile.platform)));
        scripts.push(GPU_VENDOR.to_string());
    }
    scripts
}

fn override_getter(property: &str, value_js: &str) -> String {
    format!("Object.defineProperty(navigator, '{property}', {{ get: () => {value_js} }});")
}

fn js_string(value: &str) -> String {
    format!("'{}'", value.replace(['\'', '\\'], ""))
}

fn js_array(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| js_string(v)).collect();
    format!("[{}]", items.join(","))
}
