//! Publication count tables.
//!
//! Two shapes are used while aggregating:
//!
//! - [`CountryFrame`]: a per-year frame keyed on country, grown one count
//!   column at a time by outer join.
//! - [`PublicationsTable`]: the cross-year result, one row per
//!   (year, country), grown by appending whole years.
//!
//! A cell with no data is `None`, never zero.

use crate::error::{Result, SpringerError};
use crate::metadata::FacetEntry;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use tracing::info;

/// A publication count; `None` when the country did not appear in the query result.
pub type Count = Option<u64>;

/// Fixed leading columns of every publications table
pub const KEY_COLUMNS: [&str; 2] = ["year", "country"];

/// Per-year table keyed on country name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryFrame {
    columns: Vec<String>,
    rows: Vec<(String, Vec<Count>)>,
}

impl CountryFrame {
    /// Frame with the key column only and no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// One-column frame from a country facet. An empty facet still
    /// declares the column, it just has no rows.
    pub fn from_facet(column: impl Into<String>, entries: &[FacetEntry]) -> Self {
        Self {
            columns: vec![column.into()],
            rows: entries
                .iter()
                .map(|e| (e.country.clone(), vec![Some(e.count)]))
                .collect(),
        }
    }

    /// Count columns, excluding the key
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Countries in row order
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(country, _)| country.as_str())
    }

    /// Value of `column` for the first row keyed `country`.
    ///
    /// Outer `None` means no such row or column; inner `None` is a missing cell.
    pub fn get(&self, country: &str, column: &str) -> Option<Count> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|(key, _)| key == country)
            .map(|(_, values)| values[idx])
    }

    /// Full outer join on country.
    ///
    /// Rows come out sorted by country. Rows sharing a key keep their
    /// join order: left rows first (each expanded once per matching right
    /// row), then right rows that matched nothing. Cells with no
    /// counterpart are `None`.
    pub fn outer_join(self, other: CountryFrame) -> CountryFrame {
        let left_width = self.columns.len();
        let right_width = other.columns.len();

        let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, (key, _)) in other.rows.iter().enumerate() {
            index.entry(key.as_str()).or_default().push(i);
        }

        let mut matched = vec![false; other.rows.len()];
        let mut rows = Vec::with_capacity(self.rows.len().max(other.rows.len()));

        for (key, left) in self.rows {
            match index.get(key.as_str()) {
                Some(hits) => {
                    for &i in hits {
                        matched[i] = true;
                        let mut values = left.clone();
                        values.extend_from_slice(&other.rows[i].1);
                        rows.push((key.clone(), values));
                    }
                }
                None => {
                    let mut values = left;
                    values.resize(left_width + right_width, None);
                    rows.push((key, values));
                }
            }
        }

        for ((key, right), hit) in other.rows.iter().zip(&matched) {
            if !hit {
                let mut values = vec![None; left_width];
                values.extend_from_slice(right);
                rows.push((key.clone(), values));
            }
        }

        rows.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut columns = self.columns;
        columns.extend(other.columns);

        CountryFrame { columns, rows }
    }
}

/// One (year, country) row of a [`PublicationsTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct PublicationRow {
    pub year: i32,
    pub country: String,
    /// Values aligned with [`PublicationsTable::count_columns`]
    pub counts: Vec<Count>,
}

/// Cross-year publications table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublicationsTable {
    count_columns: Vec<String>,
    rows: Vec<PublicationRow>,
}

impl PublicationsTable {
    /// Empty table with the given count columns, in canonical order.
    pub fn new(count_columns: Vec<String>) -> Self {
        Self {
            count_columns,
            rows: Vec::new(),
        }
    }

    /// All column names: `year`, `country`, then the count columns.
    pub fn columns(&self) -> Vec<String> {
        KEY_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.count_columns.iter().cloned())
            .collect()
    }

    pub fn count_columns(&self) -> &[String] {
        &self.count_columns
    }

    pub fn rows(&self) -> &[PublicationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a count column
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.count_columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| SpringerError::Column(column.to_string()))
    }

    /// Stamp every row of a per-year frame with `year` and append it.
    ///
    /// Frame columns are reordered to this table's column order; a frame
    /// lacking one of them is rejected.
    pub fn append_year(&mut self, year: i32, frame: CountryFrame) -> Result<()> {
        let positions = self
            .count_columns
            .iter()
            .map(|column| {
                frame
                    .columns
                    .iter()
                    .position(|c| c == column)
                    .ok_or_else(|| SpringerError::Column(column.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        self.rows
            .extend(frame.rows.into_iter().map(|(country, values)| PublicationRow {
                year,
                country,
                counts: positions.iter().map(|&p| values[p]).collect(),
            }));
        Ok(())
    }

    /// Rows whose country is in `countries`, original order kept.
    pub fn filter_countries(&self, countries: &[String]) -> PublicationsTable {
        PublicationsTable {
            count_columns: self.count_columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| countries.contains(&r.country))
                .cloned()
                .collect(),
        }
    }

    /// `(year, value)` pairs of one column for one country, in row order.
    pub fn series(&self, country: &str, column: &str) -> Result<Vec<(i32, Count)>> {
        let idx = self.column_index(column)?;
        Ok(self
            .rows
            .iter()
            .filter(|r| r.country == country)
            .map(|r| (r.year, r.counts[idx]))
            .collect())
    }

    /// Write as CSV: header row, then one record per row. Missing cells
    /// are empty fields.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.columns())?;

        for row in &self.rows {
            let mut record = Vec::with_capacity(2 + row.counts.len());
            record.push(row.year.to_string());
            record.push(row.country.clone());
            record.extend(
                row.counts
                    .iter()
                    .map(|c| c.map(|n| n.to_string()).unwrap_or_default()),
            );
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Read a table written by [`write_csv`](Self::write_csv).
    pub fn read_csv<R: io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();

        let leading: Vec<&str> = headers.iter().take(KEY_COLUMNS.len()).collect();
        if leading != KEY_COLUMNS {
            return Err(SpringerError::Parse(format!(
                "expected leading columns {:?}, found {:?}",
                KEY_COLUMNS, leading
            )));
        }

        let count_columns = headers
            .iter()
            .skip(KEY_COLUMNS.len())
            .map(String::from)
            .collect();
        let mut table = PublicationsTable::new(count_columns);

        for record in rdr.records() {
            let record = record?;
            let year = record
                .get(0)
                .unwrap_or_default()
                .trim()
                .parse::<i32>()
                .map_err(|e| SpringerError::Parse(format!("bad year in CSV: {}", e)))?;
            let country = record.get(1).unwrap_or_default().to_string();
            let counts = record
                .iter()
                .skip(KEY_COLUMNS.len())
                .map(parse_count)
                .collect::<Result<Vec<_>>>()?;

            table.rows.push(PublicationRow {
                year,
                country,
                counts,
            });
        }

        Ok(table)
    }

    /// Save to a CSV file
    pub fn save_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(io::BufWriter::new(file))?;
        info!(path = %path.display(), rows = self.rows.len(), "Saved publications table");
        Ok(())
    }

    /// Load from a CSV file
    pub fn load_csv(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let table = Self::read_csv(io::BufReader::new(file))?;
        info!(path = %path.display(), rows = table.rows.len(), "Loaded publications table");
        Ok(table)
    }
}

/// Empty field is a missing value. Integral floats such as `5.0` are
/// accepted so tables exported by other tools still load.
fn parse_count(field: &str) -> Result<Count> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(None);
    }
    if let Ok(n) = field.parse::<u64>() {
        return Ok(Some(n));
    }
    match field.parse::<f64>() {
        Ok(f) if f.is_nan() => Ok(None),
        Ok(f) if f >= 0.0 && f.fract() == 0.0 => Ok(Some(f as u64)),
        _ => Err(SpringerError::Parse(format!("bad count in CSV: {:?}", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(country: &str, count: u64) -> FacetEntry {
        FacetEntry {
            country: country.to_string(),
            count,
        }
    }

    #[test]
    fn test_outer_join_keeps_both_sides() {
        let left = CountryFrame::new().outer_join(CountryFrame::from_facet(
            "publications_a",
            &[entry("USA", 5), entry("Brazil", 2)],
        ));
        let right = CountryFrame::from_facet(
            "publications_a_on_x",
            &[entry("Brazil", 1), entry("Chile", 4)],
        );

        let joined = left.outer_join(right);

        assert_eq!(joined.columns(), ["publications_a", "publications_a_on_x"]);
        assert_eq!(
            joined.countries().collect::<Vec<_>>(),
            vec!["Brazil", "Chile", "USA"]
        );
        assert_eq!(joined.get("USA", "publications_a"), Some(Some(5)));
        assert_eq!(joined.get("USA", "publications_a_on_x"), Some(None));
        assert_eq!(joined.get("Brazil", "publications_a_on_x"), Some(Some(1)));
        assert_eq!(joined.get("Chile", "publications_a"), Some(None));
        assert_eq!(joined.get("Chile", "publications_a_on_x"), Some(Some(4)));
    }

    #[test]
    fn test_outer_join_empty_fragment_adds_column() {
        let frame = CountryFrame::new()
            .outer_join(CountryFrame::from_facet("publications_a", &[]))
            .outer_join(CountryFrame::from_facet("publications_a_on_x", &[entry("USA", 3)]));

        assert_eq!(frame.len(), 1);
        assert_eq!(frame.get("USA", "publications_a"), Some(None));
        assert_eq!(frame.get("USA", "publications_a_on_x"), Some(Some(3)));
    }

    #[test]
    fn test_outer_join_sorts_by_country() {
        let frame = CountryFrame::new().outer_join(CountryFrame::from_facet(
            "publications_",
            &[entry("USA", 5), entry("Brazil", 2), entry("Argentina", 1)],
        ));

        assert_eq!(
            frame.countries().collect::<Vec<_>>(),
            vec!["Argentina", "Brazil", "USA"]
        );
        assert_eq!(frame.get("Argentina", "publications_"), Some(Some(1)));
        assert_eq!(frame.get("USA", "publications_"), Some(Some(5)));
    }

    #[test]
    fn test_outer_join_duplicate_keys() {
        let left = CountryFrame::from_facet("a", &[entry("USA", 1)]);
        let right = CountryFrame::from_facet("b", &[entry("USA", 2), entry("USA", 3)]);
        let joined = left.outer_join(right);
        assert_eq!(joined.len(), 2);
    }

    #[test]
    fn test_append_year_reorders_columns() -> Result<()> {
        let frame = CountryFrame::from_facet("b", &[entry("USA", 2)])
            .outer_join(CountryFrame::from_facet("a", &[entry("USA", 1)]));

        let mut table = PublicationsTable::new(vec!["a".into(), "b".into()]);
        table.append_year(2019, frame.clone())?;
        table.append_year(2020, frame)?;

        assert_eq!(table.columns(), vec!["year", "country", "a", "b"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].year, 2019);
        assert_eq!(table.rows()[1].counts, vec![Some(1), Some(2)]);
        Ok(())
    }

    #[test]
    fn test_append_year_missing_column() {
        let mut table = PublicationsTable::new(vec!["a".into()]);
        let result = table.append_year(2020, CountryFrame::from_facet("b", &[]));
        assert!(matches!(result, Err(SpringerError::Column(c)) if c == "a"));
    }

    #[test]
    fn test_filter_and_series() -> Result<()> {
        let mut table = PublicationsTable::new(vec!["a".into()]);
        table.append_year(2019, CountryFrame::from_facet("a", &[entry("USA", 1), entry("Peru", 7)]))?;
        table.append_year(2020, CountryFrame::from_facet("a", &[entry("USA", 4)]))?;

        let usa = table.filter_countries(&["USA".to_string()]);
        assert_eq!(usa.len(), 2);
        assert_eq!(usa.series("USA", "a")?, vec![(2019, Some(1)), (2020, Some(4))]);
        assert!(matches!(usa.series("USA", "zzz"), Err(SpringerError::Column(_))));
        Ok(())
    }

    #[test]
    fn test_csv_missing_cells_are_empty() -> Result<()> {
        let frame = CountryFrame::from_facet("publications_", &[entry("USA", 5)])
            .outer_join(CountryFrame::from_facet("publications__on_", &[entry("Brazil", 2)]));
        let mut table = PublicationsTable::new(vec!["publications_".into(), "publications__on_".into()]);
        table.append_year(2020, frame)?;

        let mut buf = Vec::new();
        table.write_csv(&mut buf)?;
        let text = String::from_utf8_lossy(&buf);

        assert_eq!(
            text,
            "year,country,publications_,publications__on_\n2020,Brazil,,2\n2020,USA,5,\n"
        );

        let restored = PublicationsTable::read_csv(text.as_bytes())?;
        assert_eq!(restored, table);
        Ok(())
    }

    #[test]
    fn test_read_csv_accepts_float_counts() -> Result<()> {
        let csv = "year,country,publications_x\n2018,Japan,12.0\n2018,Kenya,\n";
        let table = PublicationsTable::read_csv(csv.as_bytes())?;
        assert_eq!(table.rows()[0].counts, vec![Some(12)]);
        assert_eq!(table.rows()[1].counts, vec![None]);
        Ok(())
    }

    #[test]
    fn test_read_csv_rejects_foreign_header() {
        let csv = "country,year\nUSA,2020\n";
        assert!(matches!(
            PublicationsTable::read_csv(csv.as_bytes()),
            Err(SpringerError::Parse(_))
        ));
    }
}
