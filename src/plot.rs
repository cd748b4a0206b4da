//! Country comparison plots.
//!
//! Renders two line charts side by side into one SVG figure: topic-wide
//! publications per year on the left, publications of that topic in one
//! journal on the right. Each selected country is one line.

use crate::error::{Result, SpringerError};
use crate::query::{topic_column, topic_on_journal_column};
use crate::table::PublicationsTable;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Fixed x axis span, in years
pub const YEAR_RANGE: (i32, i32) = (2000, 2020);

/// Years between x axis ticks
const YEAR_TICK: i32 = 2;

/// Figure size in pixels, two panels wide
const FIGURE_SIZE: (u32, u32) = (1500, 500);

const PANEL_WIDTH: i32 = 750;

const LINE_WIDTH: u32 = 2;

/// One country's points for one column, in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct CountrySeries {
    pub country: String,
    pub points: Vec<(i32, u64)>,
}

/// Collect the plottable points of `column` for each country.
///
/// Rows with a missing value, or a year outside [`YEAR_RANGE`], are skipped.
pub fn collect_series(
    table: &PublicationsTable,
    countries: &[String],
    column: &str,
) -> Result<Vec<CountrySeries>> {
    countries
        .iter()
        .map(|country| -> Result<CountrySeries> {
            let points = table
                .series(country, column)?
                .into_iter()
                .filter(|(year, _)| (YEAR_RANGE.0..=YEAR_RANGE.1).contains(year))
                .filter_map(|(year, count)| count.map(|c| (year, c)))
                .collect();
            Ok(CountrySeries {
                country: country.clone(),
                points,
            })
        })
        .collect()
}

/// Draw the topic / topic-on-journal comparison for `countries` to an SVG file.
///
/// # Errors
///
/// * [`SpringerError::Column`] if the table has no column for the topic or
///   the topic/journal pair
/// * [`SpringerError::Plot`] if rendering or writing the file fails
pub fn compare_publications(
    table: &PublicationsTable,
    countries: &[String],
    topic: &str,
    journal: &str,
    output: &Path,
) -> Result<()> {
    let selected = table.filter_countries(countries);
    let topic_series = collect_series(&selected, countries, &topic_column(topic))?;
    let journal_series = collect_series(
        &selected,
        countries,
        &topic_on_journal_column(topic, journal),
    )?;

    debug!(
        rows = selected.len(),
        countries = countries.len(),
        "Plotting publication comparison"
    );

    let root = SVGBackend::new(output, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;
    let root = root
        .titled(&capitalize(topic), ("sans-serif", 36))
        .map_err(plot_error)?;

    let (left, right) = root.split_horizontally(PANEL_WIDTH);
    draw_panel(&left, &topic_series, "# of publications", false)?;
    draw_panel(
        &right,
        &journal_series,
        &format!("# of publications on {}", capitalize(journal)),
        true,
    )?;

    root.present().map_err(plot_error)?;
    info!(path = %output.display(), "Saved comparison plot");
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    series: &[CountrySeries],
    y_label: &str,
    legend: bool,
) -> Result<()> {
    let y_max = series
        .iter()
        .flat_map(|s| s.points.iter().map(|&(_, count)| count))
        .max()
        .unwrap_or(0);
    let y_top = (y_max + y_max / 10).max(1);

    let mut chart = ChartBuilder::on(area)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(YEAR_RANGE.0..YEAR_RANGE.1, 0u64..y_top)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_labels(((YEAR_RANGE.1 - YEAR_RANGE.0) / YEAR_TICK + 1) as usize)
        .x_label_formatter(&|year| year.to_string())
        .x_desc("Year")
        .y_desc(y_label)
        .draw()
        .map_err(plot_error)?;

    for (idx, s) in series.iter().enumerate() {
        let style = Palette99::pick(idx).stroke_width(LINE_WIDTH);
        let drawn = chart
            .draw_series(LineSeries::new(s.points.iter().copied(), style))
            .map_err(plot_error)?;
        if legend {
            drawn
                .label(s.country.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }
    }

    if legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(plot_error)?;
    }

    Ok(())
}

fn plot_error<E: std::fmt::Display>(e: E) -> SpringerError {
    SpringerError::Plot(e.to_string())
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::FacetEntry;
    use crate::table::CountryFrame;

    fn entry(country: &str, count: u64) -> FacetEntry {
        FacetEntry {
            country: country.to_string(),
            count,
        }
    }

    fn sample_table() -> Result<PublicationsTable> {
        let mut table = PublicationsTable::new(vec![
            "publications_ecology".into(),
            "publications_ecology_on_oikos".into(),
        ]);
        for (year, usa, chile) in [(2004, 10, 3), (2006, 12, 5), (2008, 15, 4)] {
            let frame = CountryFrame::from_facet(
                "publications_ecology",
                &[entry("USA", usa), entry("Chile", chile), entry("Peru", 1)],
            )
            .outer_join(CountryFrame::from_facet(
                "publications_ecology_on_oikos",
                &[entry("USA", usa / 2)],
            ));
            table.append_year(year, frame)?;
        }
        Ok(table)
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("machine LEARNING"), "Machine learning");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_collect_series_skips_missing() -> Result<()> {
        let table = sample_table()?;
        let countries = vec!["USA".to_string(), "Chile".to_string()];

        let series = collect_series(&table, &countries, "publications_ecology_on_oikos")?;

        assert_eq!(series[0].points, vec![(2004, 5), (2006, 6), (2008, 7)]);
        assert!(series[1].points.is_empty());
        Ok(())
    }

    #[test]
    fn test_compare_publications_writes_svg() -> Result<()> {
        let table = sample_table()?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ecology.svg");
        let countries = vec!["USA".to_string(), "Chile".to_string()];

        compare_publications(&table, &countries, "ecology", "oikos", &path)?;

        let svg = std::fs::read_to_string(&path)?;
        assert!(svg.contains("Ecology"));
        assert!(svg.contains("USA"));
        assert!(svg.contains("Chile"));
        assert!(!svg.contains("Peru"));
        Ok(())
    }

    #[test]
    fn test_compare_publications_unknown_column() -> Result<()> {
        let table = sample_table()?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("none.svg");

        let result = compare_publications(&table, &["USA".to_string()], "ecology", "nature", &path);

        assert!(matches!(result, Err(SpringerError::Column(_))));
        assert!(!path.exists());
        Ok(())
    }
}
