//! Values computed from other fields. The wizard shows them live and the
//! server recomputes them before storing, so both sides use these functions.

use std::fmt;

use time::macros::format_description;
use time::Date;

use crate::models::{Category, ExperienceEntry, Gender, Relevance};

/// marks / max × 100 with two decimals. Empty when either is missing or max ≤ 0.
pub fn percentage(marks_obtained: Option<f64>, max_marks: Option<f64>) -> Option<String> {
    match (marks_obtained, max_marks) {
        (Some(marks), Some(max)) if marks.is_finite() && max.is_finite() && max > 0.0 => {
            Some(format!("{:.2}", marks / max * 100.0))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSpan {
    pub years: u32,
    pub months: u32,
}

impl fmt::Display for ServiceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} year(s) {} month(s)", self.years, self.months)
    }
}

pub fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Calendar-month difference between start and end. An empty end date or a
/// current job counts up to `today`. Days of the month are ignored.
pub fn service_span(start: &str, end: &str, currently_working: bool, today: Date) -> Option<ServiceSpan> {
    let start = parse_date(start)?;
    let end = if currently_working || end.trim().is_empty() {
        today
    } else {
        parse_date(end)?
    };

    let month = |d: Date| i32::from(u8::from(d.month()));
    let diff = (end.year() - start.year()) * 12 + (month(end) - month(start));
    if diff < 0 {
        return None;
    }
    let diff = diff as u32;
    Some(ServiceSpan {
        years: diff / 12,
        months: diff % 12,
    })
}

/// Reads a span back out of its display text.
pub fn parse_span(text: &str) -> Option<ServiceSpan> {
    let mut parts = text.split_whitespace();
    let years = parts.next()?.parse().ok()?;
    if parts.next()? != "year(s)" {
        return None;
    }
    let months = parts.next()?.parse().ok()?;
    if parts.next()? != "month(s)" {
        return None;
    }
    Some(ServiceSpan { years, months })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExperienceSummary {
    pub total_years: u32,
    pub score: u32,
}

pub const MAX_EXPERIENCE_SCORE: u32 = 25;
pub const SCORE_PER_YEAR: u32 = 5;

/// Sums relevant rows; six or more leftover months round the row up a year.
pub fn experience_summary(entries: &[ExperienceEntry]) -> ExperienceSummary {
    let total_years = entries
        .iter()
        .filter(|entry| entry.relevant == Relevance::Yes)
        .filter_map(|entry| parse_span(&entry.duration_text))
        .map(|span| span.years + u32::from(span.months >= 6))
        .sum::<u32>();

    ExperienceSummary {
        total_years,
        score: (total_years * SCORE_PER_YEAR).min(MAX_EXPERIENCE_SCORE),
    }
}

pub const CONCESSION_FEE: u32 = 100;
pub const STANDARD_FEE: u32 = 200;

pub fn exam_fee(category: Option<Category>, gender: Option<Gender>) -> u32 {
    let concession_category = matches!(
        category,
        Some(Category::Sc | Category::St | Category::Divyang | Category::Female)
    );
    if concession_category || gender == Some(Gender::Female) {
        CONCESSION_FEE
    } else {
        STANDARD_FEE
    }
}
