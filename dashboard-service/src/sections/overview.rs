use askama::Template;
use time::Time;

use energy_client::{
    analytics::daily_means,
    domain::{CapacityRecord, ConsumptionRecord, Variable},
};

use super::{chart_or_skip, format_timestamp, navigation, unix_seconds, NavLink, Section, SectionError};
use crate::{
    charts::{format_thousands, line_chart, Series, XAxis},
    config::AnalysisConfig,
    store::DataStore,
};

const CONSUMPTION_COLUMNS: [&str; 4] = ["Timestamp", "Gas (MW PCS)", "Electricity (MW)", "Total consumption (MW)"];
const CAPACITY_COLUMNS: [&str; 3] = ["Year", "Installed wind (MW)", "Installed solar (MW)"];

#[derive(Template)]
#[template(path = "overview.html")]
struct OverviewPage {
    nav: Vec<NavLink>,
    consumption_rows: usize,
    consumption_columns: &'static [&'static str],
    consumption_preview: Vec<Vec<String>>,
    daily_chart: Option<String>,
    capacity_rows: usize,
    capacity_columns: &'static [&'static str],
    capacity_preview: Vec<Vec<String>>,
    capacity_chart: Option<String>,
}

pub fn render(store: &DataStore, analysis: &AnalysisConfig) -> Result<String, SectionError> {
    let page = OverviewPage {
        nav: navigation(Section::Overview),
        consumption_rows: store.consumption.len(),
        consumption_columns: &CONSUMPTION_COLUMNS,
        consumption_preview: store
            .consumption
            .iter()
            .take(analysis.preview_rows)
            .map(consumption_row)
            .collect(),
        daily_chart: chart_or_skip("daily_consumption", daily_chart(&store.consumption)),
        capacity_rows: store.capacity.len(),
        capacity_columns: &CAPACITY_COLUMNS,
        capacity_preview: store
            .capacity
            .iter()
            .take(analysis.preview_rows)
            .map(capacity_row)
            .collect(),
        capacity_chart: chart_or_skip("installed_capacity", capacity_chart(&store.capacity)),
    };
    Ok(page.render()?)
}

fn consumption_row(r: &ConsumptionRecord) -> Vec<String> {
    vec![
        format_timestamp(r.ts),
        format_thousands(r.gas_mw),
        format_thousands(r.electricity_mw),
        format_thousands(r.total_mw),
    ]
}

fn capacity_row(r: &CapacityRecord) -> Vec<String> {
    let cell = |v: Option<f64>| v.map(format_thousands).unwrap_or_else(|| "n/a".to_string());
    vec![r.year.to_string(), cell(r.wind_capacity_mw), cell(r.solar_capacity_mw)]
}

fn daily_chart(records: &[ConsumptionRecord]) -> Result<String, crate::charts::ChartError> {
    let daily = daily_means(records);
    let series: Vec<Series> = Variable::ALL
        .into_iter()
        .map(|v| {
            let points = daily
                .iter()
                .map(|d| {
                    let y = match v {
                        Variable::Electricity => d.electricity_mw,
                        Variable::Gas => d.gas_mw,
                        Variable::Total => d.total_mw,
                    };
                    (unix_seconds(d.date.with_time(Time::MIDNIGHT)), y)
                })
                .collect();
            Series::new(v.label(), points)
        })
        .collect();
    line_chart("Daily mean consumption", XAxis::Date, "MW", &series)
}

fn capacity_chart(capacity: &[CapacityRecord]) -> Result<String, crate::charts::ChartError> {
    let by_year = |pick: fn(&CapacityRecord) -> Option<f64>| -> Vec<(f64, f64)> {
        capacity
            .iter()
            .filter_map(|c| pick(c).map(|v| (f64::from(c.year), v)))
            .collect()
    };
    let series = vec![
        Series::new("Installed wind (MW)", by_year(|c| c.wind_capacity_mw)),
        Series::new("Installed solar (MW)", by_year(|c| c.solar_capacity_mw)),
    ];
    line_chart("Installed wind and solar capacity", XAxis::Year, "MW", &series)
}
