//! Search query strings and publication column names.
//!
//! The Springer metadata API takes a single `q` parameter whose terms are
//! joined with `+`. Terms are concatenated verbatim: topic and journal text
//! is never escaped.

use std::fmt;

/// Document type every query is restricted to
const DOCUMENT_TYPE: &str = "Journal";

/// Result page requested; pagination is not followed
const FIRST_PAGE: u32 = 0;

/// Prefix shared by every count column
pub const PUBLICATIONS_PREFIX: &str = "publications_";

/// One (year, topic[, journal]) search against the metadata API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<'a> {
    pub year: i32,
    /// Free-text topic; empty means all topics
    pub topic: &'a str,
    /// Journal filter; `None` means all journals
    pub journal: Option<&'a str>,
}

impl<'a> Query<'a> {
    /// Topic-wide query for a year.
    pub fn topic(year: i32, topic: &'a str) -> Self {
        Self {
            year,
            topic,
            journal: None,
        }
    }

    /// Topic query narrowed to a single journal.
    pub fn topic_on_journal(year: i32, topic: &'a str, journal: &'a str) -> Self {
        Self {
            year,
            topic,
            journal: Some(journal),
        }
    }

    /// Name of the table column this query's counts land in.
    pub fn column_name(&self) -> String {
        match self.journal {
            Some(journal) => topic_on_journal_column(self.topic, journal),
            None => topic_column(self.topic),
        }
    }
}

impl fmt::Display for Query<'_> {
    /// Renders the `q` parameter, e.g. `year:2020+oncology+journal:Nature+type:Journal&p=0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "year:{}+{}+", self.year, self.topic)?;
        if let Some(journal) = self.journal {
            write!(f, "journal:{}+", journal)?;
        }
        write!(f, "type:{}&p={}", DOCUMENT_TYPE, FIRST_PAGE)
    }
}

/// `publications_<topic>`
pub fn topic_column(topic: &str) -> String {
    format!("{}{}", PUBLICATIONS_PREFIX, topic)
}

/// `publications_<topic>_on_<journal>`
pub fn topic_on_journal_column(topic: &str, journal: &str) -> String {
    format!("{}{}_on_{}", PUBLICATIONS_PREFIX, topic, journal)
}

/// Count columns in canonical order: each topic column followed by its
/// per-journal columns.
pub fn publication_columns(topics: &[String], journals: &[String]) -> Vec<String> {
    let mut cols = Vec::with_capacity(topics.len() * (1 + journals.len()));
    for topic in topics {
        cols.push(topic_column(topic));
        for journal in journals {
            cols.push(topic_on_journal_column(topic, journal));
        }
    }
    cols
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_query_string() {
        let q = Query::topic(2020, "oncology");
        assert_eq!(q.to_string(), "year:2020+oncology+type:Journal&p=0");
        assert_eq!(q.column_name(), "publications_oncology");
    }

    #[test]
    fn test_journal_query_string() {
        let q = Query::topic_on_journal(2015, "oncology", "Nature");
        assert_eq!(
            q.to_string(),
            "year:2015+oncology+journal:Nature+type:Journal&p=0"
        );
        assert_eq!(q.column_name(), "publications_oncology_on_Nature");
    }

    #[test]
    fn test_empty_topic_and_journal() {
        assert_eq!(Query::topic(2020, "").to_string(), "year:2020++type:Journal&p=0");
        assert_eq!(
            Query::topic_on_journal(2020, "", "").to_string(),
            "year:2020++journal:+type:Journal&p=0"
        );
        assert_eq!(Query::topic_on_journal(2020, "", "").column_name(), "publications__on_");
    }

    #[test]
    fn test_publication_columns_order() {
        let topics = vec!["a".to_string(), "b".to_string()];
        let journals = vec!["x".to_string(), "y".to_string()];
        assert_eq!(
            publication_columns(&topics, &journals),
            vec![
                "publications_a",
                "publications_a_on_x",
                "publications_a_on_y",
                "publications_b",
                "publications_b_on_x",
                "publications_b_on_y",
            ]
        );
    }
}
