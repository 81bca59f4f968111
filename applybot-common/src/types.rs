use crate::{ApplyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One posting as read from a results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary_text: Option<String>,
    pub detail_url: String,
    /// The posting runs its own application wizard instead of redirecting
    /// to an employer site.
    pub quick_apply: bool,
}

/// How a screening question expects its answer.
///
/// Produced once by extraction and dispatched on once by the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputModality {
    /// Single line `<input>` (text, number, email, tel, date).
    FreeText,
    /// Multi line `<textarea>`.
    LongText,
    /// Radio buttons or checkboxes.
    SingleChoice,
    /// `<select>` drop-down.
    Select,
    Unknown,
}

/// One screening question on the current wizard step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBlock {
    pub question_text: String,
    pub modality: InputModality,
    /// Offered options in page order, without duplicates.
    pub choices: Vec<String>,
    /// Value already present in a free-text field.
    pub prefilled: Option<String>,
    /// `name` attribute of the underlying form control.
    pub field_name: Option<String>,
    /// The step cannot be submitted while this field is empty.
    pub required: bool,
}

/// Why an application attempt ended in [`Outcome::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NoApplyButton,
    Stuck,
    NoConfirmation,
    Unanswerable(String),
    Interaction(String),
    Unexpected(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoApplyButton => write!(f, "no apply button"),
            FailureReason::Stuck => write!(f, "stuck in the application wizard"),
            FailureReason::NoConfirmation => write!(f, "no confirmation after submit"),
            FailureReason::Unanswerable(q) => write!(f, "could not answer required question: {q}"),
            FailureReason::Interaction(e) => write!(f, "interaction failed: {e}"),
            FailureReason::Unexpected(e) => write!(f, "unexpected fault: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Submitted,
    Failed(FailureReason),
    Skipped(String),
}

impl Outcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, Outcome::Submitted)
    }

    /// Submitted and failed attempts are final for the posting; skips are not.
    pub fn is_terminal_attempt(&self) -> bool {
        matches!(self, Outcome::Submitted | Outcome::Failed(_))
    }
}

/// Ledger row for one posting considered during a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationResult {
    pub job_id: String,
    pub outcome: Outcome,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub url: String,
}

impl ApplicationResult {
    pub fn new(job: &JobSummary, outcome: Outcome) -> Self {
        Self {
            job_id: job.id.clone(),
            outcome,
            title: job.title.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            salary: job.salary_text.clone().unwrap_or_default(),
            url: job.detail_url.clone(),
        }
    }
}

/// Location searched within a country, e.g. `("remote", "canada")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub location: String,
    pub country: String,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.location, self.country)
    }
}

/// Listing-page filters applied to every search of a campaign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Only postings from the last N days.
    #[serde(default)]
    pub past_days: Option<u32>,
    /// e.g. `fulltime`, `parttime`, `contract`.
    #[serde(default)]
    pub job_type: Option<String>,
    /// e.g. `entry_level`, `mid_level`, `senior_level`.
    #[serde(default)]
    pub experience_level: Option<String>,
    /// Search radius around the location, in miles.
    #[serde(default)]
    pub radius: Option<u32>,
    #[serde(default)]
    pub remote: bool,
}

/// One execution covering the cross product of queries and regions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub queries: Vec<String>,
    pub regions: Vec<Region>,
    pub total_quota: u32,
    #[serde(default)]
    pub negate_title_words: Vec<String>,
    #[serde(default)]
    pub negate_company_words: Vec<String>,
    /// Annual salary floor; postings without a readable salary are rejected
    /// only when this is set.
    #[serde(default)]
    pub min_salary: Option<u64>,
    #[serde(default)]
    pub filters: SearchFilters,
}

impl Campaign {
    /// Trim inputs, drop blank entries, and reject campaigns that cannot run.
    pub fn validated(mut self) -> Result<Self> {
        self.queries = clean_list(self.queries);
        self.negate_title_words = clean_list(self.negate_title_words);
        self.negate_company_words = clean_list(self.negate_company_words);
        self.regions = self
            .regions
            .into_iter()
            .map(|r| Region {
                location: r.location.trim().to_string(),
                country: r.country.trim().to_lowercase(),
            })
            .filter(|r| !r.country.is_empty())
            .collect();

        if self.queries.is_empty() {
            return Err(ApplyError::Config("campaign has no queries".into()));
        }
        if self.regions.is_empty() {
            return Err(ApplyError::Config("campaign has no regions".into()));
        }
        if self.total_quota == 0 {
            return Err(ApplyError::Config("campaign total_quota must be positive".into()));
        }
        Ok(self)
    }

    pub fn pair_count(&self) -> u32 {
        (self.queries.len() * self.regions.len()) as u32
    }

    /// Smallest per-pair quota whose sum over all pairs covers the total.
    pub fn per_pair_quota(&self) -> u32 {
        match self.pair_count() {
            0 => 0,
            pairs => self.total_quota.div_ceil(pairs),
        }
    }

    /// Every (query, region) pair, regions outermost.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &Region)> + '_ {
        self.regions
            .iter()
            .flat_map(move |r| self.queries.iter().map(move |q| (q.as_str(), r)))
    }
}

fn clean_list(list: Vec<String>) -> Vec<String> {
    list.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    /// Years of experience, kept as text because questions accept "5" or "5+".
    pub years: String,
}

/// Operator data used to answer screening questions.
///
/// Built once from validated configuration and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country_code: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub highest_education: String,
    pub current_job_title: String,
    pub current_company: String,
    pub linkedin: String,
    pub website: String,
    pub desired_salary: String,
    pub salary_type: String,
    pub currency: String,
    pub employment_type: String,
    pub hours_per_week: String,
    pub start_date: String,
    pub interview_availability: String,
    pub clearance: String,
    pub skills: Vec<Skill>,
    pub languages: Vec<String>,
    pub certifications: Vec<String>,
    pub over_18: bool,
    pub requires_sponsorship: bool,
    pub eligible_to_work: bool,
    pub remote: bool,
}

impl Profile {
    /// Look up a scalar profile field by its configuration name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "first_name" => &self.first_name,
            "last_name" => &self.last_name,
            "email" => &self.email,
            "phone" => &self.phone,
            "country_code" => &self.country_code,
            "street_address" => &self.street_address,
            "city" => &self.city,
            "state" => &self.state,
            "postal_code" => &self.postal_code,
            "country" => &self.country,
            "highest_education" => &self.highest_education,
            "current_job_title" => &self.current_job_title,
            "current_company" => &self.current_company,
            "linkedin" => &self.linkedin,
            "website" => &self.website,
            "desired_salary" => &self.desired_salary,
            "salary_type" => &self.salary_type,
            "currency" => &self.currency,
            "employment_type" => &self.employment_type,
            "hours_per_week" => &self.hours_per_week,
            "start_date" => &self.start_date,
            "interview_availability" => &self.interview_availability,
            "clearance" => &self.clearance,
            _ => return None,
        };
        let value = value.trim();
        (!value.is_empty()).then_some(value)
    }

    pub fn full_name(&self) -> String {
        join_nonempty(&[&self.first_name, &self.last_name])
    }

    pub fn full_address(&self) -> String {
        join_nonempty(&[&self.city, &self.state])
    }
}

fn join_nonempty(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(location: &str, country: &str) -> Region {
        Region {
            location: location.into(),
            country: country.into(),
        }
    }

    #[test]
    fn per_pair_quota_is_minimal_cover() {
        let mut campaign = Campaign {
            queries: vec!["a".into(), "b".into()],
            regions: vec![region("x", "c")],
            total_quota: 5,
            ..Campaign::default()
        };
        assert_eq!(campaign.per_pair_quota(), 3);

        for total in 1..=40 {
            campaign.total_quota = total;
            let per = campaign.per_pair_quota();
            let pairs = campaign.pair_count();
            assert!(per * pairs >= total);
            assert!((per - 1) * pairs < total, "quota {per} not minimal for {total}");
        }

        campaign.total_quota = 4;
        assert_eq!(campaign.per_pair_quota(), 2);
    }

    #[test]
    fn validation_cleans_lists_and_rejects_empty_campaigns() {
        let campaign = Campaign {
            queries: vec![" rust engineer ".into(), "".into()],
            regions: vec![region(" Toronto ", " Canada ")],
            total_quota: 3,
            negate_title_words: vec!["".into()],
            negate_company_words: vec![" Acme ".into()],
            ..Campaign::default()
        }
        .validated()
        .unwrap();

        assert_eq!(campaign.queries, vec!["rust engineer"]);
        assert!(campaign.negate_title_words.is_empty());
        assert_eq!(campaign.negate_company_words, vec!["Acme"]);
        assert_eq!(campaign.regions[0], region("Toronto", "canada"));

        let empty = Campaign {
            queries: vec![" ".into()],
            regions: vec![region("x", "canada")],
            total_quota: 1,
            ..Campaign::default()
        };
        assert!(matches!(empty.validated(), Err(ApplyError::Config(_))));

        let no_quota = Campaign {
            queries: vec!["a".into()],
            regions: vec![region("x", "canada")],
            total_quota: 0,
            ..Campaign::default()
        };
        assert!(no_quota.validated().is_err());
    }

    #[test]
    fn pairs_iterate_regions_outermost() {
        let campaign = Campaign {
            queries: vec!["a".into(), "b".into()],
            regions: vec![region("x", "c"), region("y", "c")],
            total_quota: 1,
            ..Campaign::default()
        };
        let pairs: Vec<_> = campaign
            .pairs()
            .map(|(q, r)| format!("{q}@{}", r.location))
            .collect();
        assert_eq!(pairs, vec!["a@x", "b@x", "a@y", "b@y"]);
    }

    #[test]
    fn profile_fields_ignore_blank_values() {
        let profile = Profile {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            city: "London".into(),
            email: "  ".into(),
            ..Profile::default()
        };
        assert_eq!(profile.field("first_name"), Some("Ada"));
        assert_eq!(profile.field("email"), None);
        assert_eq!(profile.field("no_such_field"), None);
        assert_eq!(profile.full_name(), "Ada Lovelace");
        assert_eq!(profile.full_address(), "London");
    }
}
