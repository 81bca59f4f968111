use applybot_drivers::Target;

/// Quote `value` as an XPath 1.0 string literal.
///
/// ```
/// use applybot_web::xpath_literal;
///
/// assert_eq!(xpath_literal("Yes"), r#""Yes""#);
/// assert_eq!(xpath_literal(r#"say "hi""#), r#"'say "hi"'"#);
/// assert_eq!(
///     xpath_literal(r#"it's "x""#),
///     r#"concat("it's ", '"', "x", '"')"#
/// );
/// ```
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    let mut parts = Vec::new();
    for (i, chunk) in value.split('"').enumerate() {
        if i > 0 {
            parts.push("'\"'".to_string());
        }
        if !chunk.is_empty() {
            parts.push(format!("\"{chunk}\""));
        }
    }
    format!("concat({})", parts.join(", "))
}

fn button_with_text(texts: &[&str]) -> Target {
    let tests = texts
        .iter()
        .map(|t| format!("contains(text(), {})", xpath_literal(t)))
        .collect::<Vec<_>>()
        .join(" or ");
    Target::xpath(format!("//button//span[{tests}]"))
}

/// Affordances of the job board's pages.
#[derive(Debug, Clone)]
pub struct SiteLocators {
    pub apply: Target,
    pub apply_anyway: Target,
    pub continue_step: Target,
    pub review: Target,
    pub submit: Target,
    pub next_page: Target,
}

impl Default for SiteLocators {
    fn default() -> Self {
        Self {
            apply: button_with_text(&["Apply"]),
            apply_anyway: button_with_text(&["Apply anyway"]),
            continue_step: button_with_text(&["Continue", "continue"]),
            review: button_with_text(&["Review"]),
            submit: button_with_text(&["Submit"]),
            next_page: Target::xpath(r#"//nav//a[@aria-label="Next Page"]"#),
        }
    }
}

impl SiteLocators {
    pub fn text_input(&self, name: &str) -> Target {
        Target::xpath(format!("//input[@name={}]", xpath_literal(name)))
    }

    pub fn textarea(&self, name: &str) -> Target {
        Target::xpath(format!("//textarea[@name={}]", xpath_literal(name)))
    }

    /// Radio or checkbox of group `name` whose visible label is `label`.
    pub fn choice(&self, name: &str, label: &str) -> Target {
        let label = xpath_literal(label);
        Target::xpath(format!(
            "//input[@name={}][following-sibling::span[1][normalize-space(.)={label}] or ancestor::label[1][normalize-space(.)={label}]]",
            xpath_literal(name)
        ))
    }

    pub fn select_option(&self, name: &str, label: &str) -> Target {
        Target::xpath(format!(
            "//select[@name={}]//option[normalize-space(.)={}]",
            xpath_literal(name),
            xpath_literal(label)
        ))
    }
}
