//! The four dashboard views. Each renders a full HTML page from the shared,
//! read-only [`DataStore`](crate::store::DataStore).

pub mod conclusions;
pub mod deep_dive;
pub mod introduction;
pub mod overview;

use time::{macros::format_description, Date, PrimitiveDateTime};

use crate::charts::ChartError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Introduction,
    Overview,
    DeepDive,
    Conclusions,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Introduction,
        Section::Overview,
        Section::DeepDive,
        Section::Conclusions,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Introduction => "Introduction",
            Section::Overview => "Overview",
            Section::DeepDive => "Deep Dive",
            Section::Conclusions => "Conclusions",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Section::Introduction => "introduction",
            Section::Overview => "overview",
            Section::DeepDive => "deep-dive",
            Section::Conclusions => "conclusions",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Section::Introduction => "/introduction",
            Section::Overview => "/overview",
            Section::DeepDive => "/deep-dive",
            Section::Conclusions => "/conclusions",
        }
    }
}

pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// Sidebar links with exactly one entry marked active.
pub fn navigation(active: Section) -> Vec<NavLink> {
    Section::ALL
        .into_iter()
        .map(|s| NavLink {
            href: s.path(),
            label: s.title(),
            active: s == active,
        })
        .collect()
}

#[derive(thiserror::Error, Debug)]
pub enum SectionError {
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

/// A chart that fails to render is left out of the page rather than failing it.
fn chart_or_skip(chart: &'static str, rendered: Result<String, ChartError>) -> Option<String> {
    match rendered {
        Ok(svg) => Some(svg),
        Err(e) => {
            tracing::warn!(chart, error = %e, "skipping chart");
            None
        }
    }
}

fn format_timestamp(ts: PrimitiveDateTime) -> String {
    ts.format(format_description!("[day]/[month]/[year] [hour]:[minute]"))
        .unwrap_or_else(|_| ts.to_string())
}

/// `YYYY-MM-DD`, the value format of `<input type="date">`.
fn format_iso_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

fn unix_seconds(ts: PrimitiveDateTime) -> f64 {
    ts.assume_utc().unix_timestamp() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn navigation_marks_one_active_section() {
        let nav = navigation(Section::DeepDive);
        assert_eq!(nav.len(), 4);
        assert_eq!(nav.iter().filter(|l| l.active).count(), 1);
        assert_eq!(nav.iter().find(|l| l.active).map(|l| l.href), Some("/deep-dive"));
    }

    #[test]
    fn formats_dates_for_display_and_inputs() {
        assert_eq!(format_timestamp(datetime!(2012-01-02 07:30)), "02/01/2012 07:30");
        assert_eq!(format_iso_date(date!(2012-01-02)), "2012-01-02");
    }
}
