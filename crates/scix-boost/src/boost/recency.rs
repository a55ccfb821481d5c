use chrono::{DateTime, NaiveDate};

use crate::config::RankingConfig;

/// Average month length used to convert day deltas into months.
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Parses a bibliographic date.
///
/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps. A `00` day of month, as used
/// for month-precision pubdates, is read as the first of the month.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(month) = trimmed.strip_suffix("-00") {
        return NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").ok();
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|timestamp| timestamp.date_naive())
}

/// Reciprocal decay that boosts recent work for a bounded horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecencyDecay {
    multiplier: f64,
    max_age_months: f64,
}

impl RecencyDecay {
    pub fn new(multiplier: f64, max_age_months: f64) -> Self {
        Self {
            multiplier,
            max_age_months,
        }
    }

    pub fn from_config(config: &RankingConfig) -> Self {
        Self::new(config.recency_multiplier(), config.recency_max_age_months())
    }

    /// Score in `(0, 1]` for the earlier of the two dates.
    ///
    /// Unknown age is neutral (1.0), as is anything older than the horizon.
    pub fn score(
        &self,
        pubdate: Option<NaiveDate>,
        entry_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> f64 {
        let reference = match (pubdate, entry_date) {
            (Some(published), Some(entered)) => published.min(entered),
            (Some(date), None) | (None, Some(date)) => date,
            (None, None) => return 1.0,
        };

        let age_months = age_in_months(reference, today);
        if age_months > self.max_age_months {
            return 1.0;
        }

        1.0 / (1.0 + self.multiplier * age_months)
    }
}

/// Whole days elapsed over the average month; future dates count as zero.
pub fn age_in_months(reference: NaiveDate, today: NaiveDate) -> f64 {
    let days = (today - reference).num_days().max(0);
    days as f64 / DAYS_PER_MONTH
}
