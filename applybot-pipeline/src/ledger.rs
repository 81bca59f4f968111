//! In-memory record of every posting considered, flushed to a CSV table.
//!
//! Only submitted applications reach the table. The file is appended to
//! across runs and never truncated; the header is written when the file is
//! created.
use applybot_common::{ApplicationResult, Outcome, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

const HEADER: [&str; 5] = ["Title", "Company", "Location", "Salary", "URL"];

#[derive(Debug)]
pub struct ResultsLedger {
    path: PathBuf,
    rows: Vec<ApplicationResult>,
    flushed: usize,
}

impl ResultsLedger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            rows: Vec::new(),
            flushed: 0,
        }
    }

    pub fn record(&mut self, result: ApplicationResult) {
        self.rows.push(result);
    }

    pub fn rows(&self) -> &[ApplicationResult] {
        &self.rows
    }

    pub fn submitted(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Submitted))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(&r.outcome)).count()
    }

    /// Append submissions recorded since the last flush. Returns the number
    /// of rows written.
    pub fn flush(&mut self) -> Result<usize> {
        let pending: Vec<&ApplicationResult> = self.rows[self.flushed..]
            .iter()
            .filter(|r| r.outcome.is_submitted())
            .collect();
        if pending.is_empty() {
            self.flushed = self.rows.len();
            return Ok(0);
        }

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::Writer::from_writer(file);
        if is_new {
            writer.write_record(HEADER)?;
        }
        for row in &pending {
            writer.write_record([
                row.title.as_str(),
                row.company.as_str(),
                row.location.as_str(),
                row.salary.as_str(),
                row.url.as_str(),
            ])?;
        }
        writer.flush()?;

        let written = pending.len();
        self.flushed = self.rows.len();
        tracing::info!(path = %self.path.display(), rows = written, "results flushed");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use applybot_common::{FailureReason, JobSummary};

    fn result(id: &str, outcome: Outcome) -> ApplicationResult {
        let job = JobSummary {
            id: id.into(),
            title: format!("Engineer {id}"),
            company: "Acme, Inc.".into(),
            location: "Remote".into(),
            salary_text: None,
            detail_url: format!("https://www.indeed.com/viewjob?jk={id}"),
            quick_apply: true,
        };
        ApplicationResult::new(&job, outcome)
    }

    #[test]
    fn only_submissions_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("submissions.csv");

        let mut ledger = ResultsLedger::new(&path);
        ledger.record(result("a1", Outcome::Submitted));
        ledger.record(result("b2", Outcome::Failed(FailureReason::Stuck)));
        ledger.record(result("c3", Outcome::Skipped("already processed".into())));
        assert_eq!(ledger.flush().unwrap(), 1);
        assert_eq!(ledger.flush().unwrap(), 0);
        assert_eq!((ledger.submitted(), ledger.failed(), ledger.skipped()), (1, 1, 1));

        let mut next_run = ResultsLedger::new(&path);
        next_run.record(result("d4", Outcome::Submitted));
        assert_eq!(next_run.flush().unwrap(), 1);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Title,Company,Location,Salary,URL",
                "Engineer a1,\"Acme, Inc.\",Remote,,https://www.indeed.com/viewjob?jk=a1",
                "Engineer d4,\"Acme, Inc.\",Remote,,https://www.indeed.com/viewjob?jk=d4",
            ]
        );
    }
}
