//! Filtered analysis of the consumption table.
//!
//! Filters arrive as query parameters. A request without `applied` is the
//! first visit and gets the defaults: the full data span and all three
//! variables. Once the form has been submitted, an unchecked box means the
//! variable is deselected. Dates that are absent or do not parse fall back
//! to the corresponding end of the data span.
//!
//! Links can also name the variables directly with `vars=electricity,gas`,
//! which takes precedence over the checkboxes. Unknown names are ignored.

use askama::Template;
use serde::Deserialize;
use time::{macros::format_description, Date};

use energy_client::{
    analytics::{
        data_quality, filter_range, hourly_average, renewable_percentage, totals,
        yearly_peak_vs_capacity, Column, DataQualityReport, DateRange, PeakVsCapacity,
    },
    domain::{ConsumptionRecord, Variable},
};

use super::{chart_or_skip, format_iso_date, navigation, unix_seconds, NavLink, Section, SectionError};
use crate::{
    charts::{format_thousands, hourly_bar_chart, line_chart, small_multiples, Series, XAxis},
    config::AnalysisConfig,
    store::DataStore,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeepDiveQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub electricity: Option<String>,
    pub gas: Option<String>,
    pub total: Option<String>,
    pub applied: Option<String>,
    pub vars: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepDiveFilters {
    /// `None` only when there is no data and no usable date in the query.
    pub range: Option<DateRange>,
    pub variables: Vec<Variable>,
}

impl DeepDiveQuery {
    pub fn filters(&self, span: Option<DateRange>) -> DeepDiveFilters {
        let start = parse_date(self.start.as_deref()).or(span.map(|s| s.start));
        let end = parse_date(self.end.as_deref()).or(span.map(|s| s.end));
        let range = match (start, end) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)),
            (Some(day), None) | (None, Some(day)) => Some(DateRange::new(day, day)),
            (None, None) => None,
        };

        let variables = if let Some(list) = self.vars.as_deref() {
            parse_variable_list(list)
        } else if self.applied.is_some() {
            Variable::ALL.into_iter().filter(|v| self.is_checked(*v)).collect()
        } else {
            Variable::ALL.to_vec()
        };

        DeepDiveFilters { range, variables }
    }

    fn is_checked(&self, variable: Variable) -> bool {
        let field = match variable {
            Variable::Electricity => &self.electricity,
            Variable::Gas => &self.gas,
            Variable::Total => &self.total,
        };
        field.is_some()
    }
}

/// Comma-separated variable keys, deduplicated and kept in display order.
fn parse_variable_list(list: &str) -> Vec<Variable> {
    let mut picked = Vec::new();
    for part in list.split(',').filter(|p| !p.trim().is_empty()) {
        match part.parse::<Variable>() {
            Ok(v) if !picked.contains(&v) => picked.push(v),
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "ignoring variable"),
        }
    }
    Variable::ALL.into_iter().filter(|v| picked.contains(v)).collect()
}

fn parse_date(raw: Option<&str>) -> Option<Date> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

struct VariableOption {
    key: &'static str,
    label: &'static str,
    checked: bool,
}

struct CountRow {
    label: &'static str,
    count: usize,
}

struct QualityPanel {
    clean: bool,
    rows: usize,
    missing: Vec<CountRow>,
    duplicate_rows: usize,
    negative: Vec<CountRow>,
}

impl From<&DataQualityReport> for QualityPanel {
    fn from(report: &DataQualityReport) -> Self {
        Self {
            clean: report.is_clean(),
            rows: report.rows,
            missing: Column::ALL
                .into_iter()
                .map(|c| CountRow {
                    label: c.label(),
                    count: report.missing_in(c),
                })
                .collect(),
            duplicate_rows: report.duplicate_rows,
            negative: report
                .negative
                .iter()
                .map(|(v, count)| CountRow {
                    label: v.label(),
                    count: *count,
                })
                .collect(),
        }
    }
}

struct Kpi {
    label: &'static str,
    value: String,
}

#[derive(Template)]
#[template(path = "deep_dive.html")]
struct DeepDivePage {
    nav: Vec<NavLink>,
    start: String,
    end: String,
    min_date: String,
    max_date: String,
    range_inverted: bool,
    variable_options: Vec<VariableOption>,
    quality: QualityPanel,
    kpis: Vec<Kpi>,
    has_variables: bool,
    line_chart: Option<String>,
    hourly_chart: Option<String>,
    peak_from_year: i32,
    peak_chart: Option<String>,
    small_multiples: Option<String>,
}

pub fn render(store: &DataStore, analysis: &AnalysisConfig, query: &DeepDiveQuery) -> Result<String, SectionError> {
    let span = DateRange::spanning(&store.consumption);
    let filters = query.filters(span);
    let variables = filters.variables.as_slice();

    let filtered: &[ConsumptionRecord] = match &filters.range {
        Some(range) => filter_range(&store.consumption, range),
        None => &[],
    };
    tracing::debug!(
        rows = filtered.len(),
        variables = variables.len(),
        "deep dive filters applied"
    );

    let quality = data_quality(filtered, variables);
    let sums = totals(filtered);
    let pct = renewable_percentage(&store.capacity, sums.electricity_mw);

    let kpis = vec![
        Kpi {
            label: "Total Electricity (MW)",
            value: format_thousands(sums.electricity_mw),
        },
        Kpi {
            label: "Total Gas (MW PCS)",
            value: format_thousands(sums.gas_mw),
        },
        Kpi {
            label: "Total Consumption (MW)",
            value: format_thousands(sums.total_mw),
        },
        Kpi {
            label: "Approx. % Renewable Capacity",
            value: format!("{pct:.1}%"),
        },
    ];

    let (line, hourly, multiples) = if variables.is_empty() {
        (None, None, None)
    } else {
        let series = variable_series(filtered, variables);
        let hourly = hourly_average(filtered, variables);
        (
            chart_or_skip(
                "consumption_over_time",
                line_chart("Consumption over time", XAxis::Date, "MW", &series),
            ),
            chart_or_skip(
                "hourly_average",
                hourly_bar_chart("Average consumption by hour", &hourly, variables),
            ),
            (series.len() > 1)
                .then(|| {
                    chart_or_skip(
                        "small_multiples",
                        small_multiples("Consumption small multiples", XAxis::Date, "MW", &series),
                    )
                })
                .flatten(),
        )
    };

    let joined = yearly_peak_vs_capacity(&store.consumption, &store.capacity, analysis.peak_from_year);
    let peak = chart_or_skip("peak_vs_capacity", peak_chart(&joined));

    let date_or_blank = |d: Option<Date>| d.map(format_iso_date).unwrap_or_default();
    let page = DeepDivePage {
        nav: navigation(Section::DeepDive),
        start: date_or_blank(filters.range.map(|r| r.start)),
        end: date_or_blank(filters.range.map(|r| r.end)),
        min_date: date_or_blank(span.map(|s| s.start)),
        max_date: date_or_blank(span.map(|s| s.end)),
        range_inverted: filters.range.is_some_and(|r| r.is_inverted()),
        variable_options: Variable::ALL
            .into_iter()
            .map(|v| VariableOption {
                key: v.key(),
                label: v.label(),
                checked: variables.contains(&v),
            })
            .collect(),
        quality: QualityPanel::from(&quality),
        kpis,
        has_variables: !variables.is_empty(),
        line_chart: line,
        hourly_chart: hourly,
        peak_from_year: analysis.peak_from_year,
        peak_chart: peak,
        small_multiples: multiples,
    };
    Ok(page.render()?)
}

fn variable_series(records: &[ConsumptionRecord], variables: &[Variable]) -> Vec<Series> {
    variables
        .iter()
        .map(|v| {
            let points = records.iter().map(|r| (unix_seconds(r.ts), r.value(*v))).collect();
            Series::new(v.label(), points)
        })
        .collect()
}

fn peak_chart(joined: &[PeakVsCapacity]) -> Result<String, crate::charts::ChartError> {
    let peaks = joined
        .iter()
        .map(|j| (f64::from(j.year), j.peak_electricity_mw))
        .collect();
    let green = joined
        .iter()
        .filter_map(|j| j.green_capacity_mw.map(|g| (f64::from(j.year), g)))
        .collect();
    let series = vec![
        Series::new("Peak electricity (MW)", peaks),
        Series::new("Green capacity (MW)", green),
    ];
    line_chart("Peak annual electricity vs installed renewable", XAxis::Year, "MW", &series)
}
