//! HTML extraction for listing pages and wizard steps.
//!
//! Pure functions over page source. Absent optional fields degrade to empty
//! strings or `None`; nothing here returns an error.
use applybot_common::{InputModality, JobSummary, QuestionBlock};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

const QUESTION_ITEM: &str = r#"[class*="Questions-item"]"#;
const FREE_TEXT_TYPES: &[&str] = &["", "text", "number", "email", "tel", "date", "url", "search"];

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::debug!(css, error = %e, "unusable selector");
            None
        }
    }
}

fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    scope.select(&sel).next()
}

fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(sel) => scope.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// Visible text with whitespace collapsed.
fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(s: String) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

fn salary_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"(?i)^(?:from\s+|up to\s+)?[$£€₹]\s?\d[\d,]*(?:\.\d+)?\s*k?\b").ok()
        })
        .as_ref()
}

fn quoted_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""(.+?)""#).ok()).as_ref()
}

/// Parse every job card on a results page.
///
/// `domain` is the site's registrable domain; detail links always point at
/// its `www.` host.
pub fn extract_job_summaries(html: &str, domain: &str) -> Vec<JobSummary> {
    let document = Html::parse_document(html);
    let Some(cards) = selector("div.job_seen_beacon") else {
        return Vec::new();
    };

    document
        .select(&cards)
        .filter_map(|card| {
            let summary = job_from_card(card, domain);
            if summary.is_none() {
                tracing::debug!("job card without data-jk; skipped");
            }
            summary
        })
        .collect()
}

fn job_from_card(card: ElementRef<'_>, domain: &str) -> Option<JobSummary> {
    let id = select_first(card, "a[data-jk]")
        .and_then(|a| a.value().attr("data-jk"))
        .map(str::trim)
        .filter(|jk| !jk.is_empty())?
        .to_string();

    let title = title_for(card, &id);
    let company = select_first(card, r#"span[data-testid="company-name"]"#)
        .map(text_of)
        .unwrap_or_default();
    let location = select_first(card, r#"div[data-testid="text-location"]"#)
        .map(text_of)
        .unwrap_or_default();
    let quick_apply = text_of(card).to_lowercase().contains("easily apply")
        || select_first(card, r#"[data-testid="indeedApply"]"#).is_some();

    Some(JobSummary {
        detail_url: detail_url(domain, &id),
        salary_text: salary_in(card),
        id,
        title,
        company,
        location,
        quick_apply,
    })
}

fn title_for(card: ElementRef<'_>, id: &str) -> String {
    let by_id = if id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        select_first(card, &format!(r#"span[id="jobTitle-{id}"]"#))
    } else {
        None
    };
    by_id
        .or_else(|| select_first(card, "h2 span[title]"))
        .or_else(|| select_first(card, "a[data-jk]"))
        .map(text_of)
        .unwrap_or_default()
}

fn salary_in(card: ElementRef<'_>) -> Option<String> {
    let tagged = [
        r#"[data-testid="attribute_snippet_testid"]"#,
        r#"[class*="salary-snippet"]"#,
        r#"[class*="salaryOnly"]"#,
    ];
    for css in tagged {
        if let Some(text) = select_first(card, css).map(text_of).and_then(non_empty) {
            if text.chars().any(|c| c.is_ascii_digit()) {
                return Some(text);
            }
        }
    }
    let pattern = salary_pattern()?;
    card.text()
        .map(str::trim)
        .find(|t| pattern.is_match(t))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn detail_url(domain: &str, id: &str) -> String {
    match Url::parse(&format!("https://www.{domain}/viewjob")) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("jk", id);
            url.to_string()
        }
        Err(_) => format!("https://www.{domain}/viewjob?jk={id}"),
    }
}

/// Whether the listing offers a further results page.
pub fn has_next_page(html: &str) -> bool {
    let document = Html::parse_document(html);
    select_first(document.root_element(), r#"nav a[aria-label="Next Page"]"#).is_some()
}

/// Bot-detection challenge markers (captcha widgets, interstitials).
pub fn is_obstructed(html: &str) -> bool {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let widgets = [
        "#challenge-form",
        "#challenge-stage",
        ".cf-turnstile",
        ".h-captcha",
        ".g-recaptcha",
        r#"iframe[src*="captcha"]"#,
        r#"iframe[src*="challenges.cloudflare.com"]"#,
    ];
    if widgets.iter().any(|css| select_first(root, css).is_some()) {
        return true;
    }
    let title = select_first(root, "title")
        .map(text_of)
        .unwrap_or_default()
        .to_lowercase();
    if title.contains("just a moment") || title.contains("security check") {
        return true;
    }
    let body = select_first(root, "body")
        .map(text_of)
        .unwrap_or_default()
        .to_lowercase();
    body.contains("verify you are human") || body.contains("additional verification required")
}

/// Fingerprint of a wizard step, used to tell whether advancing changed it.
pub fn step_signature(url: &str, html: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(url.as_bytes());
    for block in extract_question_blocks(html) {
        hasher.update(b"\x1f");
        hasher.update(block.question_text.as_bytes());
    }
    let document = Html::parse_document(html);
    for heading in select_all(document.root_element(), "h1, h2") {
        hasher.update(b"\x1e");
        hasher.update(text_of(heading).as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Parse the screening questions shown on the current wizard step.
pub fn extract_question_blocks(html: &str) -> Vec<QuestionBlock> {
    let document = Html::parse_document(html);
    let Some(items) = selector(QUESTION_ITEM) else {
        return Vec::new();
    };

    document
        .select(&items)
        // Keep the innermost item when the marker class is nested.
        .filter(|item| item.select(&items).next().is_none())
        .filter_map(question_from_item)
        .collect()
}

fn question_from_item(item: ElementRef<'_>) -> Option<QuestionBlock> {
    let Some(question_text) = question_text(item) else {
        tracing::debug!("question item without question text; skipped");
        return None;
    };

    let required = select_all(item, "input, select, textarea").iter().any(|f| {
        let v = f.value();
        v.attr("required").is_some() || v.attr("aria-required") == Some("true")
    });

    let mut block = QuestionBlock {
        question_text,
        modality: InputModality::Unknown,
        choices: Vec::new(),
        prefilled: None,
        field_name: None,
        required,
    };

    let first_input = select_all(item, "input")
        .into_iter()
        .find(|i| i.value().attr("type") != Some("hidden"));

    if let Some(input) = first_input {
        let kind = input
            .value()
            .attr("type")
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        block.field_name = input.value().attr("name").map(str::to_string);
        if kind == "radio" || kind == "checkbox" {
            block.modality = InputModality::SingleChoice;
            block.choices = dedup(
                select_all(item, "input")
                    .into_iter()
                    .filter(|i| i.value().attr("type") != Some("hidden"))
                    .filter_map(choice_label),
            );
        } else if FREE_TEXT_TYPES.contains(&kind.as_str()) {
            block.modality = InputModality::FreeText;
            block.prefilled = input
                .value()
                .attr("value")
                .map(str::to_string)
                .and_then(non_empty);
        }
    } else if let Some(select) = select_first(item, "select") {
        block.modality = InputModality::Select;
        block.field_name = select.value().attr("name").map(str::to_string);
        block.choices = dedup(
            select_all(select, "option")
                .into_iter()
                .filter(|o| o.value().attr("value").is_some_and(|v| !v.trim().is_empty()))
                .filter_map(|o| non_empty(text_of(o))),
        );
    } else if let Some(area) = select_first(item, "textarea") {
        block.modality = InputModality::LongText;
        block.field_name = area.value().attr("name").map(str::to_string);
        block.prefilled = area
            .value()
            .attr("value")
            .map(str::to_string)
            .and_then(non_empty)
            .or_else(|| non_empty(text_of(area)));
    }

    Some(block)
}

fn question_text(item: ElementRef<'_>) -> Option<String> {
    let raw = [r#"span[data-testid="rich-text"]"#, "legend", "label"]
        .iter()
        .find_map(|css| select_first(item, css).map(text_of).and_then(non_empty))?;

    let longest_quoted = quoted_pattern().and_then(|p| {
        p.captures_iter(&raw)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .max_by_key(|s| s.len())
            .map(str::to_string)
    });
    Some(longest_quoted.unwrap_or(raw))
}

/// Text offered next to a radio/checkbox: the following `span`, else the
/// enclosing `label`.
fn choice_label(input: ElementRef<'_>) -> Option<String> {
    let sibling = input
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "span")
        .map(text_of)
        .and_then(non_empty);
    sibling.or_else(|| {
        input
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "label")
            .map(text_of)
            .and_then(non_empty)
    })
}

fn dedup(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
