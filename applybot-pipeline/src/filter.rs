//! Decides whether a posting is worth an application attempt.
use crate::salary::annual_max;
use applybot_common::{Campaign, JobSummary};
use std::collections::HashSet;
use std::fmt;

/// Read access to the set of already processed job ids.
pub trait SeenJobs {
    fn contains(&self, job_id: &str) -> bool;
}

impl SeenJobs for HashSet<String> {
    fn contains(&self, job_id: &str) -> bool {
        HashSet::contains(self, job_id)
    }
}

/// The first rule a posting failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotQuickApply,
    AlreadyProcessed,
    NegatedTitle(String),
    NegatedCompany(String),
    SalaryUnreadable,
    SalaryBelowFloor { annual: u64, floor: u64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotQuickApply => write!(f, "applies on an external site"),
            Rejection::AlreadyProcessed => write!(f, "already processed"),
            Rejection::NegatedTitle(w) => write!(f, "title contains {w:?}"),
            Rejection::NegatedCompany(w) => write!(f, "company contains {w:?}"),
            Rejection::SalaryUnreadable => write!(f, "salary missing or unreadable"),
            Rejection::SalaryBelowFloor { annual, floor } => {
                write!(f, "salary {annual} below floor {floor}")
            }
        }
    }
}

/// Run the rules in order and stop at the first failure.
pub fn evaluate(
    job: &JobSummary,
    campaign: &Campaign,
    seen: &dyn SeenJobs,
) -> Result<(), Rejection> {
    if !job.quick_apply {
        return Err(Rejection::NotQuickApply);
    }
    if seen.contains(&job.id) {
        return Err(Rejection::AlreadyProcessed);
    }
    if let Some(word) = first_match(&job.title, &campaign.negate_title_words) {
        return Err(Rejection::NegatedTitle(word.to_string()));
    }
    if let Some(word) = first_match(&job.company, &campaign.negate_company_words) {
        return Err(Rejection::NegatedCompany(word.to_string()));
    }
    if let Some(floor) = campaign.min_salary {
        let annual = job
            .salary_text
            .as_deref()
            .and_then(annual_max)
            .ok_or(Rejection::SalaryUnreadable)?;
        if annual < floor {
            return Err(Rejection::SalaryBelowFloor { annual, floor });
        }
    }
    Ok(())
}

pub fn passes(job: &JobSummary, campaign: &Campaign, seen: &dyn SeenJobs) -> bool {
    evaluate(job, campaign, seen).is_ok()
}

fn first_match<'w>(haystack: &str, words: &'w [String]) -> Option<&'w str> {
    let haystack = haystack.to_lowercase();
    words
        .iter()
        .map(|w| w.trim())
        .find(|w| !w.is_empty() && haystack.contains(&w.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingSeen {
        calls: Cell<u32>,
    }

    impl SeenJobs for CountingSeen {
        fn contains(&self, _job_id: &str) -> bool {
            self.calls.set(self.calls.get() + 1);
            false
        }
    }

    fn job(id: &str) -> JobSummary {
        JobSummary {
            id: id.into(),
            title: "Senior Rust Engineer".into(),
            company: "Ferrous Systems".into(),
            location: "Remote".into(),
            salary_text: Some("$60 an hour".into()),
            detail_url: format!("https://www.indeed.com/viewjob?jk={id}"),
            quick_apply: true,
        }
    }

    fn campaign() -> Campaign {
        Campaign {
            negate_title_words: vec!["intern".into()],
            negate_company_words: vec!["staffing".into()],
            min_salary: Some(100_000),
            ..Campaign::default()
        }
    }

    #[test]
    fn external_postings_short_circuit() {
        let seen = CountingSeen { calls: Cell::new(0) };
        let mut j = job("a1");
        j.quick_apply = false;
        assert_eq!(evaluate(&j, &campaign(), &seen), Err(Rejection::NotQuickApply));
        assert_eq!(seen.calls.get(), 0);

        j.quick_apply = true;
        assert_eq!(evaluate(&j, &campaign(), &seen), Ok(()));
        assert_eq!(seen.calls.get(), 1);
    }

    #[test]
    fn processed_ids_never_pass() {
        let seen: HashSet<String> = ["a1".to_string()].into_iter().collect();
        assert!(!passes(&job("a1"), &campaign(), &seen));
        assert!(passes(&job("b2"), &campaign(), &seen));
    }

    #[test]
    fn negate_words_match_case_insensitively() {
        let seen: HashSet<String> = HashSet::new();
        let mut j = job("a1");
        j.title = "Software INTERNship".into();
        assert_eq!(
            evaluate(&j, &campaign(), &seen),
            Err(Rejection::NegatedTitle("intern".into()))
        );
        let mut j = job("a1");
        j.company = "Acme Staffing LLC".into();
        assert_eq!(
            evaluate(&j, &campaign(), &seen),
            Err(Rejection::NegatedCompany("staffing".into()))
        );
    }

    #[test]
    fn salary_floor_applies_only_when_set() {
        let seen: HashSet<String> = HashSet::new();
        let mut j = job("a1");
        j.salary_text = Some("$40 an hour".into());
        assert_eq!(
            evaluate(&j, &campaign(), &seen),
            Err(Rejection::SalaryBelowFloor {
                annual: 83_200,
                floor: 100_000
            })
        );
        j.salary_text = None;
        assert_eq!(evaluate(&j, &campaign(), &seen), Err(Rejection::SalaryUnreadable));

        let no_floor = Campaign {
            min_salary: None,
            ..campaign()
        };
        assert!(passes(&j, &no_floor, &seen));
    }
}
