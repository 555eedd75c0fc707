/// Chart and CSV output for a monthly water area series
use chrono::{Days, NaiveDate, NaiveDateTime};
use log::{debug, info};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};
use swe_data::{DataError, DateRange, TimeSeries};
use swe_utils::paths::next_free_output_path;

pub const TITLE: &str = "Surface Water Extent Time Series";
pub const X_LABEL: &str = "Date";
pub const Y_LABEL: &str = "Water Area (square meters)";

/// Chart size in pixels.
pub const CHART_SIZE: (u32, u32) = (1000, 600);

/// Padding on each side of the plotted dates.
const DATE_PADDING: Days = Days::new(15);

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to create {path}: {source}")]
    CreateFile {
        path: String,
        source: std::io::Error,
    },

    #[error("Chart generation error: {0}")]
    Chart(String),

    #[error("No sans-serif font could be loaded for chart labels; install a system font such as DejaVu Sans")]
    NoFont,

    #[error(transparent)]
    Data(#[from] DataError),
}

pub type Result<T> = std::result::Result<T, ReportError>;

fn chart_error<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Chart(format!("{e}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Png,
    Svg,
}

impl ChartFormat {
    /// Split a configured base into its stem and the chart format named by
    /// its extension. Anything other than `.svg` renders PNG.
    pub fn from_base(base: &Path) -> (PathBuf, ChartFormat) {
        let extension = base
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some("svg") => (base.with_extension(""), ChartFormat::Svg),
            Some("png") => (base.with_extension(""), ChartFormat::Png),
            _ => (base.to_path_buf(), ChartFormat::Png),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Png => "png",
            ChartFormat::Svg => "svg",
        }
    }
}

/// Dates spanned by the chart: the observed span when there is one,
/// otherwise the requested window, padded on both sides.
fn x_range(series: &TimeSeries, window: &DateRange) -> Range<NaiveDate> {
    let (first, last) = match series.time_span() {
        Some((first, last)) => (first.date(), last.date()),
        None if !window.is_empty() => (window.start, window.end),
        None => {
            let day = window.start.min(window.end);
            (day, day)
        }
    };
    let start = first.checked_sub_days(DATE_PADDING).unwrap_or(first);
    let end = last.checked_add_days(DATE_PADDING).unwrap_or(last);
    start..end
}

fn y_max(series: &TimeSeries) -> f64 {
    match series.max_area() {
        Some(max) if max > 0.0 => max * 1.1,
        _ => 1.0,
    }
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    series: &TimeSeries,
    window: &DateRange,
) -> Result<()> {
    root.fill(&WHITE).map_err(chart_error)?;

    let dates: RangedDate<NaiveDate> = x_range(series, window).into();
    let mut chart = ChartBuilder::on(root)
        .caption(TITLE, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(100)
        .build_cartesian_2d(dates, 0f64..y_max(series))
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .x_desc(X_LABEL)
        .y_desc(Y_LABEL)
        .x_labels(10)
        .x_label_formatter(&|d| d.format("%Y-%m").to_string())
        .y_label_formatter(&|v| format!("{:.0}", v))
        .draw()
        .map_err(chart_error)?;

    // a missing month ends one line and starts the next
    for segment in series.segments() {
        chart
            .draw_series(LineSeries::new(
                segment.iter().map(|(t, area)| (t.date(), *area)),
                &BLUE,
            ))
            .map_err(chart_error)?;
    }
    chart
        .draw_series(
            series
                .points()
                .map(|(t, area)| Circle::new((t.date(), area), 3, BLUE.filled())),
        )
        .map_err(chart_error)?;

    root.present().map_err(chart_error)?;
    Ok(())
}

/// Render `series` to `path`.
pub fn render_chart(
    series: &TimeSeries,
    window: &DateRange,
    path: &Path,
    format: ChartFormat,
) -> Result<()> {
    if !fonts_available() {
        return Err(ReportError::NoFont);
    }
    debug!(
        "Rendering {} points ({} gaps) to {}",
        series.len() - series.gaps(),
        series.gaps(),
        path.display()
    );
    match format {
        ChartFormat::Svg => {
            let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
            draw_chart(&root, series, window)
        }
        ChartFormat::Png => {
            let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
            draw_chart(&root, series, window)
        }
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|source| ReportError::CreateDir {
                path: dir.display().to_string(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Path and format of the chart for `base`, with a single timestamp
/// suffix. Never names an existing file.
pub fn chart_path(base: &Path, now: NaiveDateTime) -> (PathBuf, ChartFormat) {
    let (stem, format) = ChartFormat::from_base(base);
    (next_free_output_path(&stem, &now, format.extension()), format)
}

/// Sort the series and render it to `path`.
pub fn write_chart(
    series: &TimeSeries,
    window: &DateRange,
    path: &Path,
    format: ChartFormat,
) -> Result<()> {
    let mut sorted = series.clone();
    sorted.sort();

    ensure_parent(path)?;
    render_chart(&sorted, window, path, format)?;
    info!("Chart written to {}", path.display());
    Ok(())
}

/// Write the series as CSV beside `chart_path`, sharing its stem.
pub fn write_csv(series: &TimeSeries, chart_path: &Path) -> Result<PathBuf> {
    let mut sorted = series.clone();
    sorted.sort();

    let path = chart_path.with_extension("csv");
    ensure_parent(&path)?;
    let file = File::create(&path).map_err(|source| ReportError::CreateFile {
        path: path.display().to_string(),
        source,
    })?;
    sorted.write_csv(file)?;
    info!("Series written to {}", path.display());
    Ok(path)
}

/// Whether a sans-serif font can be laid out on this machine.
pub fn fonts_available() -> bool {
    FontDesc::new(FontFamily::SansSerif, 12.0, FontStyle::Normal)
        .box_size(X_LABEL)
        .is_ok()
}
