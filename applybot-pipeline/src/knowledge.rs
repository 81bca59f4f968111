//! Knowledge base construction.
//!
//! The seed table names question templates per category. Each category is
//! expanded against the operator profile into concrete question → answer
//! pairs; verbatim private answers are applied last and win over anything a
//! template produced. The result is read-only for the rest of the run.
use applybot_common::{KnowledgeSeed, Profile};
use std::collections::BTreeMap;

const BLANK: &str = "[BLANK]";
const FALLBACK_ANSWER: &str = "Prefer not to say";

/// Normalized question text → answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBase {
    entries: BTreeMap<String, String>,
}

/// Canonical form of a question used as knowledge base key.
///
/// ```
/// use applybot_pipeline::knowledge::normalize_question;
///
/// assert_eq!(
///     normalize_question("  \"Are you  willing to\nrelocate?\" * "),
///     "are you willing to relocate?"
/// );
/// assert_eq!(normalize_question("Phone number:"), "phone number");
/// ```
pub fn normalize_question(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut s = collapsed.as_str();
    loop {
        let trimmed = s
            .trim()
            .trim_end_matches(['*', ':'])
            .trim()
            .trim_matches(|c| c == '"' || c == '\'' || c == '“' || c == '”');
        if trimmed.len() == s.len() {
            break;
        }
        s = trimmed;
    }
    s.to_lowercase()
}

impl KnowledgeBase {
    /// Expand `seed` against `profile`. `search_country` fills the `[BLANK]`
    /// of work-authorization templates.
    pub fn build(profile: &Profile, seed: &KnowledgeSeed, search_country: &str) -> Self {
        let mut kb = KnowledgeBase::default();
        let country = title_case(search_country);

        for (category, templates) in &seed.templates {
            let category = category.trim().to_lowercase().replace([' ', '-'], "_");
            match category.as_str() {
                "skills" => {
                    for skill in &profile.skills {
                        kb.expand(templates, &skill.name, skill.years.trim());
                    }
                }
                "skills_other" => {
                    for skill in &profile.skills {
                        kb.expand(templates, &skill.name, "Yes");
                    }
                }
                "languages" => {
                    if profile.languages.is_empty() {
                        kb.expand(templates, "English", "Yes");
                    }
                    for language in &profile.languages {
                        kb.expand(templates, language, "Yes");
                    }
                }
                "certifications" => {
                    if profile.certifications.is_empty() {
                        kb.expand(templates, "", "No");
                    }
                    for cert in &profile.certifications {
                        kb.expand(templates, cert, "Yes");
                    }
                }
                "requires_sponsorship" => {
                    kb.expand(templates, &country, yes_no(profile.requires_sponsorship))
                }
                "eligible_to_work" => {
                    kb.expand(templates, &country, yes_no(profile.eligible_to_work))
                }
                "over_18" => kb.expand(templates, &country, yes_no(profile.over_18)),
                "full_name" => kb.expand(templates, "", &profile.full_name()),
                "full_address" => kb.expand(templates, "", &profile.full_address()),
                other => {
                    let answer = profile
                        .field(other)
                        .map(str::to_string)
                        .unwrap_or_else(|| default_answer(other));
                    kb.expand(templates, "", &answer);
                }
            }
        }

        for (question, answer) in &seed.answers {
            kb.insert(question, answer);
        }

        tracing::debug!(entries = kb.len(), "knowledge base built");
        kb
    }

    fn expand(&mut self, templates: &[String], blank: &str, answer: &str) {
        for template in templates {
            self.insert(&template.replace(BLANK, blank.trim()), answer);
        }
    }

    /// Add or replace one entry. Blank questions or answers are ignored.
    pub fn insert(&mut self, question: &str, answer: &str) {
        let key = normalize_question(question);
        let answer = answer.trim();
        if key.is_empty() || answer.is_empty() {
            return;
        }
        self.entries.insert(key, answer.to_string());
    }

    /// Exact lookup after normalization.
    pub fn get(&self, question: &str) -> Option<&str> {
        self.entries
            .get(&normalize_question(question))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order. The order is stable for the life of the value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(q, a)| (q.as_str(), a.as_str()))
    }
}

impl<Q: AsRef<str>, A: AsRef<str>> FromIterator<(Q, A)> for KnowledgeBase {
    fn from_iter<I: IntoIterator<Item = (Q, A)>>(iter: I) -> Self {
        let mut kb = KnowledgeBase::default();
        for (q, a) in iter {
            kb.insert(q.as_ref(), a.as_ref());
        }
        kb
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// Built-in answers for profile fields the operator left empty.
fn default_answer(field: &str) -> String {
    let answer = match field {
        "clearance" => "No Clearance",
        "country_code" => "1",
        "linkedin" | "website" => "No Website",
        "salary_type" => "Annual",
        "currency" => "USD",
        "employment_type" => "Fulltime",
        "hours_per_week" => "40",
        "start_date" => return chrono::Local::now().format("%m/%d/%y").to_string(),
        "interview_availability" => "Anytime",
        _ => FALLBACK_ANSWER,
    };
    answer.to_string()
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
