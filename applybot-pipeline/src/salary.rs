//! Salary text normalization.
use regex::Regex;
use std::sync::OnceLock;

const HOURS_PER_YEAR: f64 = 2080.0;
const WORKDAYS_PER_YEAR: f64 = 260.0;

fn amount_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d{1,3}(?:,\d{3})+|\d+)(?:\.(\d+))?\s*(k\b)?").ok())
        .as_ref()
}

fn period_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(year|annual|annum|hour|hr|day|daily|week|month)").ok())
        .as_ref()
}

/// Annual multiplier for the first pay period named in `text`.
fn period_multiplier(text: &str) -> f64 {
    let Some(found) = period_pattern().and_then(|re| re.find(text)) else {
        return 1.0;
    };
    match found.as_str().to_lowercase().as_str() {
        "hour" | "hr" => HOURS_PER_YEAR,
        "day" | "daily" => WORKDAYS_PER_YEAR,
        "week" => 52.0,
        "month" => 12.0,
        _ => 1.0,
    }
}

/// Highest amount in `text`, scaled to a yearly figure.
///
/// ```
/// use applybot_pipeline::salary::annual_max;
///
/// assert_eq!(annual_max("$40/hour"), Some(83_200));
/// assert_eq!(annual_max("$5,000/month"), Some(60_000));
/// assert_eq!(annual_max("$120,000 - $150,000 a year"), Some(150_000));
/// assert_eq!(annual_max("Competitive"), None);
/// ```
pub fn annual_max(text: &str) -> Option<u64> {
    let re = amount_pattern()?;
    let max = re
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(1)?.as_str().replace(',', "");
            let mut value: f64 = match caps.get(2) {
                Some(frac) => format!("{whole}.{}", frac.as_str()).parse().ok()?,
                None => whole.parse().ok()?,
            };
            if caps.get(3).is_some() {
                value *= 1000.0;
            }
            Some(value)
        })
        .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))?;

    if max <= 0.0 {
        return None;
    }
    Some((max * period_multiplier(text)).round() as u64)
}
