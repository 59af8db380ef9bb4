//! Boundary parsing of feed request parameters.
//!
//! Turns free-form query-string pairs into a typed [`FeedCriteria`].
//! Repeated keys accumulate (`techs=go&techs=rust`), the bracketed form
//! (`techs[]=go`) is accepted, and empty values are ignored. Numeric
//! parameters that are present but not finite numbers are rejected here so
//! the ranking engine never sees them.

use anyhow::{bail, Result};

use craftfolio_feed_core::criteria::{FeedCriteria, SortKey};

/// Parse `(key, value)` pairs from a feed query string.
pub fn parse_feed_query(pairs: &[(String, String)]) -> Result<FeedCriteria> {
    let mut criteria = FeedCriteria::default();
    let mut sort_param: Option<&str> = None;

    for (key, value) in pairs {
        let value = value.trim();
        match key.trim_end_matches("[]") {
            "techs" => {
                if !value.is_empty() {
                    criteria.tech_filters.insert(value.to_string());
                }
            }
            "skills" => {
                if !value.is_empty() {
                    criteria.skill_filters.insert(value.to_string());
                }
            }
            "yearsOfExperience" => {
                criteria.exp_filter = parse_number("yearsOfExperience", value)?;
            }
            "leetcodeRating" => {
                criteria.rating_filter = parse_number("leetcodeRating", value)?;
            }
            "sortBy" => sort_param = Some(value),
            "explain" => criteria.explain = matches!(value, "true" | "1"),
            _ => {}
        }
    }

    criteria.sort_key = SortKey::from_param(sort_param);
    Ok(criteria)
}

/// Empty means absent; anything else must be a finite number.
fn parse_number(name: &str, value: &str) -> Result<Option<f64>> {
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n)),
        _ => bail!("invalid {}: '{}' is not a number", name, value),
    }
}
