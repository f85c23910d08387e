use serde::{ Deserialize, Serialize };

pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_PAGE: u32 = 1;

/// A full-text query. Pages are 1-based; backends that count from zero convert.
///
/// `limit` and `page` are never zero, however the query was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSearchQuery")]
pub struct SearchQuery {
    q: String,
    query_by: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<String>,
    limit: u32,
    page: u32,
}

#[derive(Deserialize)]
struct RawSearchQuery {
    q: String,
    #[serde(default)]
    query_by: Vec<String>,
    #[serde(default)]
    filters: Option<String>,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default = "default_page")]
    page: u32,
}

impl From<RawSearchQuery> for SearchQuery {
    fn from(raw: RawSearchQuery) -> Self {
        let mut query = SearchQuery::new(raw.q)
            .with_query_by(raw.query_by)
            .with_limit(raw.limit)
            .with_page(raw.page);
        query.filters = raw.filters;
        query
    }
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

fn default_page() -> u32 {
    DEFAULT_PAGE
}

impl SearchQuery {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            query_by: Vec::new(),
            filters: None,
            limit: DEFAULT_LIMIT,
            page: DEFAULT_PAGE,
        }
    }

    pub fn with_query_by<I, S>(mut self, fields: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> {
        self.query_by = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filters(mut self, filters: impl Into<String>) -> Self {
        self.filters = Some(filters.into());
        self
    }

    /// Zero is clamped to one.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Zero is clamped to one.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn q(&self) -> &str {
        &self.q
    }

    pub fn query_by(&self) -> &[String] {
        &self.query_by
    }

    /// Filter expression, if one is set and non-empty.
    pub fn filters(&self) -> Option<&str> {
        self.filters.as_deref().filter(|f| !f.is_empty())
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Number of hits skipped before the requested page.
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Flat parameter list, suitable for a query string.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("q".to_string(), self.q.clone())];
        if !self.query_by.is_empty() {
            params.push(("query_by".to_string(), self.query_by.join(",")));
        }
        if let Some(filters) = self.filters() {
            params.push(("filter_by".to_string(), filters.to_string()));
        }
        params.push(("per_page".to_string(), self.limit.to_string()));
        params.push(("page".to_string(), self.page.to_string()));
        params
    }
}
