use applybot_common::InputModality;
use applybot_web::{
    extract_job_summaries, extract_question_blocks, has_next_page, step_signature,
};

const LISTING: &str = r#"
<html><body>
<div class="mosaic">
  <div class="job_seen_beacon">
    <h2 class="jobTitle"><a data-jk="a1b2c3" href="/rc/clk?jk=a1b2c3">
      <span id="jobTitle-a1b2c3" title="Senior Rust Engineer">Senior Rust Engineer</span></a></h2>
    <span data-testid="company-name">Ferrous Systems</span>
    <div data-testid="text-location">Toronto, ON</div>
    <div class="salary-snippet-container">$120,000 - $150,000 a year</div>
    <span class="ialbl">Easily apply</span>
  </div>
  <div class="job_seen_beacon">
    <h2 class="jobTitle"><a data-jk="d4e5f6"><span id="jobTitle-d4e5f6">Backend Developer</span></a></h2>
    <span data-testid="company-name">Acme Corp</span>
    <div data-testid="text-location">Remote</div>
    <ul><li>$40 an hour</li></ul>
  </div>
  <div class="job_seen_beacon"><span>Sponsored card without id</span></div>
</div>
<nav role="navigation"><a aria-label="Next Page" href="/jobs?start=10">Next</a></nav>
</body></html>
"#;

const STEP: &str = r#"
<html><body><h1>Questions from the employer</h1>
<div class="ia-Questions-item">
  <label for="q0"><span data-testid="rich-text">How many years of Rust experience do you have?</span></label>
  <input id="q0" type="number" name="q_years" required />
</div>
<div class="ia-Questions-item">
  <fieldset><legend>Are you willing to relocate?</legend>
    <label><input type="radio" name="q_reloc" value="1"/><span>Yes</span></label>
    <label><input type="radio" name="q_reloc" value="0"/><span>No</span></label>
  </fieldset>
</div>
<div class="ia-Questions-item">
  <label>Highest level of education</label>
  <select name="q_edu" aria-required="true">
    <option value="">Select an option</option>
    <option value="hs">High school</option>
    <option value="ba">Bachelor's</option>
    <option value="ba2">Bachelor's</option>
  </select>
</div>
<div class="ia-Questions-item">
  <label>Cover letter</label>
  <textarea name="q_cover"></textarea>
</div>
<div class="ia-Questions-item">
  <label>Phone</label>
  <input type="tel" name="q_phone" value="555-0100"/>
</div>
<div class="ia-Questions-item">
  <label>Upload your resume</label>
  <input type="file" name="q_resume"/>
</div>
<div class="ia-Questions-item"><div>No question text here</div></div>
</body></html>
"#;

#[test]
fn listing_cards_are_summarised() {
    let jobs = extract_job_summaries(LISTING, "indeed.com");
    assert_eq!(jobs.len(), 2);

    let first = &jobs[0];
    assert_eq!(first.id, "a1b2c3");
    assert_eq!(first.title, "Senior Rust Engineer");
    assert_eq!(first.company, "Ferrous Systems");
    assert_eq!(first.location, "Toronto, ON");
    assert_eq!(first.salary_text.as_deref(), Some("$120,000 - $150,000 a year"));
    assert!(first.quick_apply);
    assert_eq!(first.detail_url, "https://www.indeed.com/viewjob?jk=a1b2c3");

    let second = &jobs[1];
    assert_eq!(second.title, "Backend Developer");
    assert_eq!(second.salary_text.as_deref(), Some("$40 an hour"));
    assert!(!second.quick_apply);

    assert!(has_next_page(LISTING));
    assert!(!has_next_page("<html><body><nav></nav></body></html>"));
}

#[test]
fn question_blocks_carry_modality_and_choices() {
    let blocks = extract_question_blocks(STEP);
    assert_eq!(blocks.len(), 6);

    let years = &blocks[0];
    assert_eq!(years.question_text, "How many years of Rust experience do you have?");
    assert_eq!(years.modality, InputModality::FreeText);
    assert_eq!(years.field_name.as_deref(), Some("q_years"));
    assert!(years.required);
    assert_eq!(years.prefilled, None);

    let reloc = &blocks[1];
    assert_eq!(reloc.question_text, "Are you willing to relocate?");
    assert_eq!(reloc.modality, InputModality::SingleChoice);
    assert_eq!(reloc.choices, vec!["Yes", "No"]);
    assert!(!reloc.required);

    let edu = &blocks[2];
    assert_eq!(edu.modality, InputModality::Select);
    assert_eq!(edu.choices, vec!["High school", "Bachelor's"]);
    assert_eq!(edu.field_name.as_deref(), Some("q_edu"));
    assert!(edu.required);

    assert_eq!(blocks[3].modality, InputModality::LongText);
    assert_eq!(blocks[3].prefilled, None);

    assert_eq!(blocks[4].modality, InputModality::FreeText);
    assert_eq!(blocks[4].prefilled.as_deref(), Some("555-0100"));

    assert_eq!(blocks[5].modality, InputModality::Unknown);
}

#[test]
fn step_signature_tracks_questions_not_markup_noise() {
    let url = "https://apply.example.com/step/1";
    let a = step_signature(url, STEP);
    let b = step_signature(url, &STEP.replace("value=\"555-0100\"", "value=\"555-0199\""));
    assert_eq!(a, b);
    let other = step_signature(url, "<html><body><h1>Review your application</h1></body></html>");
    assert_ne!(a, other);
    assert_ne!(a, step_signature("https://apply.example.com/step/2", STEP));
}
