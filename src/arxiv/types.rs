/// One record returned by the arXiv search API.
///
/// Every field except the `translated_*` pair is filled by the fetcher and
/// never changed afterwards. Missing source fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paper {
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub published: String,
    pub updated: String,
    pub entry_id: String,
    pub primary_category: String,
    pub translated_title: Option<String>,
    pub translated_summary: Option<String>,
}

/// Result of one paginated fetch.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub papers: Vec<Paper>,
    /// Total hits reported by the server for the unbounded query.
    pub total_discovered: Option<u64>,
}
