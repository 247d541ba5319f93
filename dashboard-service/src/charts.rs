use plotters::{coord::Shift, prelude::*};
use time::{macros::format_description, OffsetDateTime};

use energy_client::{analytics::HourlyAverage, domain::Variable};

/// Points kept per series; longer series are averaged down to this size.
pub const MAX_POINTS_PER_SERIES: usize = 2_000;

const PALETTE: [RGBColor; 5] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
];

#[derive(thiserror::Error, Debug)]
#[error("chart rendering failed: {0}")]
pub struct ChartError(String);

type DrawResult = Result<(), Box<dyn std::error::Error>>;

/// How x values are labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XAxis {
    /// Unix seconds.
    Date,
    Year,
    Hour,
}

impl XAxis {
    fn desc(self) -> &'static str {
        match self {
            XAxis::Date => "Date",
            XAxis::Year => "Year",
            XAxis::Hour => "Hour of day",
        }
    }

    fn format(self, x: f64) -> String {
        match self {
            XAxis::Date => OffsetDateTime::from_unix_timestamp(x as i64)
                .ok()
                .and_then(|t| t.date().format(format_description!("[day]/[month]/[year]")).ok())
                .unwrap_or_default(),
            XAxis::Year | XAxis::Hour if (x - x.round()).abs() < 1e-6 => format!("{}", x.round() as i64),
            XAxis::Year | XAxis::Hour => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn new(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            points: thin(points, MAX_POINTS_PER_SERIES),
        }
    }
}

/// Averages consecutive buckets so at most `max` points remain.
fn thin(points: Vec<(f64, f64)>, max: usize) -> Vec<(f64, f64)> {
    if max == 0 || points.len() <= max {
        return points;
    }
    let bucket = points.len().div_ceil(max);
    points
        .chunks(bucket)
        .map(|chunk| {
            let n = chunk.len() as f64;
            let (sx, sy) = chunk.iter().fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
            (sx / n, sy / n)
        })
        .collect()
}

pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    if !rounded.is_finite() {
        return "n/a".to_string();
    }

    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn render_svg<F>(size: (u32, u32), draw: F) -> Result<String, ChartError>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> DrawResult,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(|e| ChartError(e.to_string()))?;
        draw(&root).map_err(|e| ChartError(e.to_string()))?;
        root.present().map_err(|e| ChartError(e.to_string()))?;
    }
    Ok(svg)
}

fn span(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn widen((lo, hi): (f64, f64)) -> std::ops::Range<f64> {
    if hi > lo {
        lo..hi
    } else {
        (lo - 1.0)..(hi + 1.0)
    }
}

/// Line chart with one line per series.
pub fn line_chart(title: &str, axis: XAxis, y_desc: &str, series: &[Series]) -> Result<String, ChartError> {
    render_svg((960, 420), |root| draw_lines(root, title, axis, y_desc, series, 0))
}

/// One stacked panel per series, sharing the x axis kind.
pub fn small_multiples(title: &str, axis: XAxis, y_desc: &str, series: &[Series]) -> Result<String, ChartError> {
    let panels = series.len().max(1);
    render_svg((960, 60 + 260 * panels as u32), |root| {
        let (header, body) = root.split_vertically(60);
        header.titled(title, ("sans-serif", 22))?;
        for (idx, (area, s)) in body.split_evenly((panels, 1)).iter().zip(series).enumerate() {
            draw_lines(area, &s.label, axis, y_desc, std::slice::from_ref(s), idx)?;
        }
        Ok(())
    })
}

fn draw_lines<DB>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    axis: XAxis,
    y_desc: &str,
    series: &[Series],
    color_offset: usize,
) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let points = || series.iter().flat_map(|s| s.points.iter().copied());
    let x_range = widen(span(points().map(|(x, _)| x)).unwrap_or((0.0, 1.0)));
    let (y_lo, y_hi) = span(points().map(|(_, y)| y)).unwrap_or((0.0, 1.0));
    let y_range = widen((y_lo.min(0.0), y_hi * 1.05));

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(axis.desc())
        .y_desc(y_desc)
        .x_labels(8)
        .x_label_formatter(&|x| axis.format(*x))
        .y_label_formatter(&|y| format_thousands(*y))
        .draw()?;

    for (i, s) in series.iter().enumerate() {
        let color = PALETTE[(i + color_offset) % PALETTE.len()];
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))?
            .label(s.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    if series.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    Ok(())
}

/// Grouped bars: one group per hour, one bar per selected variable.
pub fn hourly_bar_chart(title: &str, hourly: &[HourlyAverage], variables: &[Variable]) -> Result<String, ChartError> {
    render_svg((960, 420), |root| {
        let y_max = hourly
            .iter()
            .flat_map(|h| h.means.iter().map(|(_, m)| *m))
            .fold(0.0_f64, f64::max);
        let y_min = hourly
            .iter()
            .flat_map(|h| h.means.iter().map(|(_, m)| *m))
            .fold(0.0_f64, f64::min);

        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(-0.5..23.5, widen((y_min, y_max * 1.1)))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(XAxis::Hour.desc())
            .y_desc("MW")
            .x_labels(24)
            .x_label_formatter(&|x| XAxis::Hour.format(*x))
            .y_label_formatter(&|y| format_thousands(*y))
            .draw()?;

        let group_width = 0.8;
        let bar_width = group_width / variables.len().max(1) as f64;

        for (i, variable) in variables.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            let bars = hourly.iter().filter_map(|h| {
                let mean = h.mean(*variable)?;
                let x0 = f64::from(h.hour) - group_width / 2.0 + bar_width * i as f64;
                Some(Rectangle::new([(x0, 0.0), (x0 + bar_width, mean)], color.filled()))
            });
            chart
                .draw_series(bars)?
                .label(variable.label())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
        }

        if !variables.is_empty() {
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()?;
        }

        Ok(())
    })
}
