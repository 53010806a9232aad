use chrono::NaiveDate;

/// Upper bound on `max_results` accepted for one search.
pub const MAX_RESULTS_LIMIT: usize = 2000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("search terms must not be empty")]
    EmptyTerms,

    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("max results must be between 1 and {MAX_RESULTS_LIMIT}, got {0}")]
    MaxResults(usize),
}

/// A bounded search: terms, inclusive submission date range, result cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    terms: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    max_results: usize,
}

impl SearchQuery {
    pub fn new(
        terms: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        max_results: usize,
    ) -> Result<Self, QueryError> {
        let terms = terms.trim();
        if terms.is_empty() {
            return Err(QueryError::EmptyTerms);
        }
        if start_date > end_date {
            return Err(QueryError::InvertedRange {
                start: start_date,
                end: end_date,
            });
        }
        if max_results == 0 || max_results > MAX_RESULTS_LIMIT {
            return Err(QueryError::MaxResults(max_results));
        }
        Ok(Self {
            terms: terms.to_string(),
            start_date,
            end_date,
            max_results,
        })
    }

    pub fn terms(&self) -> &str {
        &self.terms
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// The `search_query` parameter: terms over all fields, restricted to the
    /// submission window from 00:00 on the start date to 23:59 on the end date.
    pub fn search_expression(&self) -> String {
        format!(
            "all:{} AND submittedDate:[{}0000 TO {}2359]",
            self.terms,
            self.start_date.format("%Y%m%d"),
            self.end_date.format("%Y%m%d"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn builds_search_expression_with_date_window() {
        let query = SearchQuery::new(
            "quantum error correction",
            date(2023, 1, 1),
            date(2023, 1, 31),
            5,
        )
        .unwrap();

        assert_eq!(
            query.search_expression(),
            "all:quantum error correction AND submittedDate:[202301010000 TO 202301312359]"
        );
    }

    #[test]
    fn trims_terms() {
        let query = SearchQuery::new("  llm  ", date(2024, 1, 1), date(2024, 1, 1), 1).unwrap();
        assert_eq!(query.terms(), "llm");
    }

    #[test]
    fn same_day_range_is_valid() {
        assert!(SearchQuery::new("x", date(2024, 3, 3), date(2024, 3, 3), 1).is_ok());
    }

    #[test]
    fn rejects_empty_terms() {
        let err = SearchQuery::new("   ", date(2024, 1, 1), date(2024, 2, 1), 10).unwrap_err();
        assert_eq!(err, QueryError::EmptyTerms);
    }

    #[test]
    fn rejects_start_after_end() {
        let err = SearchQuery::new("x", date(2024, 2, 1), date(2024, 1, 1), 10).unwrap_err();
        assert!(matches!(err, QueryError::InvertedRange { .. }));
        assert!(err.to_string().contains("2024-02-01"));
    }

    #[test]
    fn rejects_out_of_range_max_results() {
        assert_eq!(
            SearchQuery::new("x", date(2024, 1, 1), date(2024, 1, 2), 0).unwrap_err(),
            QueryError::MaxResults(0)
        );
        assert_eq!(
            SearchQuery::new("x", date(2024, 1, 1), date(2024, 1, 2), 2001).unwrap_err(),
            QueryError::MaxResults(2001)
        );
    }
}
