use applybot_common::{ApplyError, Region, Result, SearchFilters};
use url::Url;

/// Attribute filter the site uses for remote postings.
const REMOTE_ATTRIBUTE: &str = "0kf:attr(DSQF7);";

/// Host prefix of the country-specific site. The United States site has none.
pub fn host_prefix(country: &str) -> Result<&'static str> {
    let prefix = match country.trim().to_lowercase().as_str() {
        "canada" => "ca.",
        "france" => "fr.",
        "india" => "in.",
        "ireland" => "ie.",
        "netherlands" => "nl.",
        "united kingdom" => "uk.",
        "united states" => "",
        other => {
            return Err(ApplyError::Config(format!("unsupported country: {other:?}")));
        }
    };
    Ok(prefix)
}

/// One listing search: a query within a region, narrowed by filters.
#[derive(Debug, Clone)]
pub struct ListingQuery<'a> {
    pub query: &'a str,
    pub region: &'a Region,
    pub filters: &'a SearchFilters,
}

impl<'a> ListingQuery<'a> {
    pub fn new(query: &'a str, region: &'a Region, filters: &'a SearchFilters) -> Self {
        Self {
            query,
            region,
            filters,
        }
    }

    /// First results page for this search on `domain`.
    ///
    /// ```
    /// use applybot_common::{Region, SearchFilters};
    /// use applybot_web::ListingQuery;
    ///
    /// let region = Region { location: "Toronto".into(), country: "canada".into() };
    /// let filters = SearchFilters { past_days: Some(14), ..SearchFilters::default() };
    /// let url = ListingQuery::new("rust developer", &region, &filters)
    ///     .url("indeed.com")
    ///     .unwrap();
    /// assert_eq!(
    ///     url.as_str(),
    ///     "https://ca.indeed.com/jobs?q=rust+developer&fromage=14&l=Toronto"
    /// );
    /// ```
    pub fn url(&self, domain: &str) -> Result<Url> {
        let prefix = host_prefix(&self.region.country)?;
        let mut url = Url::parse(&format!("https://{prefix}{domain}/jobs"))
            .map_err(|e| ApplyError::Config(format!("bad site domain {domain:?}: {e}")))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", self.query.trim());
            let f = self.filters;
            if let Some(days) = f.past_days {
                pairs.append_pair("fromage", &days.to_string());
            }
            if let Some(jt) = f.job_type.as_deref().filter(|s| !s.is_empty()) {
                pairs.append_pair("jt", jt);
            }
            if let Some(lvl) = f.experience_level.as_deref().filter(|s| !s.is_empty()) {
                pairs.append_pair("explvl", lvl);
            }
            let location = self.region.location.trim();
            if !location.is_empty() {
                pairs.append_pair("l", location);
            }
            if let Some(radius) = f.radius {
                pairs.append_pair("radius", &radius.to_string());
            }
            if f.remote {
                pairs.append_pair("sc", REMOTE_ATTRIBUTE);
            }
        }
        Ok(url)
    }
}
