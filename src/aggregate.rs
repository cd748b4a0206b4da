//! Country publication aggregation.
//!
//! Walks years × topics × journals, runs one metadata query per
//! combination, and merges the country facets into a
//! [`PublicationsTable`]. Queries run strictly one after another with a
//! courtesy delay after each; the first failure aborts the run and nothing
//! accumulated so far is returned.

use crate::error::{Result, SpringerError};
use crate::metadata::{country_facet, MetadataSource};
use crate::query::{publication_columns, Query};
use crate::table::{CountryFrame, PublicationsTable, KEY_COLUMNS};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pause between API calls when none is configured
pub const DEFAULT_COURTESY_DELAY: Duration = Duration::from_secs(1);

/// Fixed pause taken after every API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    pause: Duration,
}

impl DelayPolicy {
    pub const fn fixed(pause: Duration) -> Self {
        Self { pause }
    }

    /// No pause at all
    pub const fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    /// Sleep for the configured pause.
    pub async fn wait(&self) {
        if !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }
    }
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_COURTESY_DELAY)
    }
}

/// What to aggregate: years, topics and journals, each walked in order.
///
/// An empty topic matches every topic and an empty journal every journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub years: Vec<i32>,
    pub topics: Vec<String>,
    pub journals: Vec<String>,
}

impl Selection {
    /// All topics, all journals.
    pub fn new(years: Vec<i32>) -> Self {
        Self {
            years,
            topics: vec![String::new()],
            journals: vec![String::new()],
        }
    }

    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_journals<I, S>(mut self, journals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.journals = journals.into_iter().map(Into::into).collect();
        self
    }

    /// Columns of the resulting table, in canonical order.
    pub fn columns(&self) -> Vec<String> {
        KEY_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(publication_columns(&self.topics, &self.journals))
            .collect()
    }

    /// Number of API calls an aggregation run makes.
    pub fn request_count(&self) -> usize {
        self.years.len() * self.topics.len() * (1 + self.journals.len())
    }

    /// Rejects an empty year list and any topic/journal combination that
    /// generates the same column name twice, whether from a repeated input
    /// or from distinct inputs such as topics `a` and `a_on_x` with
    /// journal `x`.
    pub fn validate(&self) -> Result<()> {
        if self.years.is_empty() {
            return Err(SpringerError::Validation(
                "at least one year is required".to_string(),
            ));
        }
        let columns = publication_columns(&self.topics, &self.journals);
        if let Some(column) = first_duplicate(&columns) {
            return Err(SpringerError::Validation(format!(
                "column {:?} generated more than once by topics {:?} and journals {:?}",
                column, self.topics, self.journals
            )));
        }
        Ok(())
    }
}

fn first_duplicate(items: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    items
        .iter()
        .find(|item| !seen.insert(item.as_str()))
        .map(String::as_str)
}

/// Build the publications table: countries with publications per year,
/// per topic, and per topic within each journal.
///
/// Rows come year by year in input order, each year's countries sorted
/// by name. Countries missing from a query's
/// facet get a missing value in that query's column.
///
/// # Errors
///
/// Any fetch or facet error aborts the run; see [`country_facet`].
pub async fn top_countries<S>(
    source: &S,
    selection: &Selection,
    delay: DelayPolicy,
) -> Result<PublicationsTable>
where
    S: MetadataSource + ?Sized,
{
    selection.validate()?;

    info!(
        years = ?selection.years,
        topics = ?selection.topics,
        journals = ?selection.journals,
        requests = selection.request_count(),
        "Starting country aggregation"
    );

    let mut table = PublicationsTable::new(publication_columns(
        &selection.topics,
        &selection.journals,
    ));

    for &year in &selection.years {
        let mut frame = CountryFrame::new();

        for topic in &selection.topics {
            let fragment = fetch_fragment(source, &Query::topic(year, topic), delay).await?;
            frame = frame.outer_join(fragment);

            for journal in &selection.journals {
                let query = Query::topic_on_journal(year, topic, journal);
                let fragment = fetch_fragment(source, &query, delay).await?;
                frame = frame.outer_join(fragment);
            }
        }

        info!(year = year, countries = frame.len(), "Aggregated year");
        table.append_year(year, frame)?;
    }

    info!(rows = table.len(), "Country aggregation complete");
    Ok(table)
}

/// Run one query and turn its country facet into a one-column frame.
async fn fetch_fragment<S>(
    source: &S,
    query: &Query<'_>,
    delay: DelayPolicy,
) -> Result<CountryFrame>
where
    S: MetadataSource + ?Sized,
{
    let q = query.to_string();
    debug!(query = %q, "Querying country facet");

    let data = source.get_metadata(&q).await?;
    let entries = country_facet(&data)?;
    if entries.is_empty() {
        warn!(query = %q, "Country facet is empty");
    }

    delay.wait().await;
    Ok(CountryFrame::from_facet(query.column_name(), &entries))
}
