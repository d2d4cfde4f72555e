//! List query parameters
//!
//! Every back-office list shares the same shape: a free-text search across a
//! fixed set of columns, equality filters on enum columns, and paging.
//! Filtering runs in SQL; nothing is fetched in full.

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Query string accepted by every list endpoint
///
/// Each collection only looks at the filters that apply to it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// Free-text search
    pub q: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub role: Option<String>,
    pub priority: Option<String>,
    pub severity: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListParams {
    pub fn search(q: &str) -> Self {
        Self {
            q: Some(q.to_string()),
            ..Self::default()
        }
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Search text, trimmed; `None` when blank
    pub fn search_term(&self) -> Option<&str> {
        non_blank(self.q.as_deref())
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// One page of a filtered collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of rows matching the filter, ignoring paging
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Build a `LIKE` pattern matching `term` anywhere, with wildcards escaped
///
/// The pattern is used with `ESCAPE '\'`.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.to_ascii_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Incrementally builds the `WHERE` clause shared by the count and page queries
pub(crate) struct Filter<'a> {
    builder: QueryBuilder<'a, Sqlite>,
    has_where: bool,
}

impl<'a> Filter<'a> {
    pub fn new(select: &str) -> Self {
        Self {
            builder: QueryBuilder::new(select),
            has_where: false,
        }
    }

    fn connective(&mut self) {
        if self.has_where {
            self.builder.push(" AND ");
        } else {
            self.builder.push(" WHERE ");
            self.has_where = true;
        }
    }

    /// Case-insensitive substring match on any of `columns`
    pub fn search(&mut self, columns: &[&str], term: Option<&str>) -> &mut Self {
        self.search_with_arrays(columns, &[], term)
    }

    /// Like [`Filter::search`], also matching any element of the JSON string
    /// arrays stored in `array_columns`
    pub fn search_with_arrays(
        &mut self,
        columns: &[&str],
        array_columns: &[&str],
        term: Option<&str>,
    ) -> &mut Self {
        let Some(term) = term else {
            return self;
        };
        let pattern = like_pattern(term);

        self.connective();
        self.builder.push("(");
        for (index, column) in columns.iter().enumerate() {
            if index > 0 {
                self.builder.push(" OR ");
            }
            self.builder
                .push(format!("LOWER({column}) LIKE "))
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\'");
        }
        for (index, column) in array_columns.iter().enumerate() {
            if index > 0 || !columns.is_empty() {
                self.builder.push(" OR ");
            }
            self.builder
                .push(format!(
                    "EXISTS (SELECT 1 FROM json_each({column}) WHERE LOWER(json_each.value) LIKE "
                ))
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\')");
        }
        self.builder.push(")");
        self
    }

    pub fn eq(&mut self, column: &str, value: Option<String>) -> &mut Self {
        if let Some(value) = value {
            self.connective();
            self.builder.push(format!("{column} = ")).push_bind(value);
        }
        self
    }

    pub fn eq_bool(&mut self, column: &str, value: Option<bool>) -> &mut Self {
        if let Some(value) = value {
            self.connective();
            self.builder.push(format!("{column} = ")).push_bind(value);
        }
        self
    }

    /// Finish as a paged query ordered by `order_by`
    pub fn page(
        mut self,
        order_by: &str,
        limit: i64,
        offset: i64,
    ) -> QueryBuilder<'a, Sqlite> {
        self.builder
            .push(format!(" ORDER BY {order_by} LIMIT "))
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        self.builder
    }

    pub fn into_builder(self) -> QueryBuilder<'a, Sqlite> {
        self.builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards_and_lowercases() {
        assert_eq!(like_pattern("Resume"), "%resume%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn paging_defaults_and_caps() {
        let params = ListParams::default();
        assert_eq!(params.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(params.offset(), 0);

        let params = ListParams {
            limit: Some(10_000),
            offset: Some(-4),
            ..ListParams::default()
        };
        assert_eq!(params.limit(), MAX_PAGE_SIZE);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn blank_search_is_ignored() {
        assert_eq!(ListParams::search("   ").search_term(), None);
        assert_eq!(ListParams::search(" pdf ").search_term(), Some("pdf"));
    }

    #[test]
    fn filter_builds_combined_where_clause() {
        let mut filter = Filter::new("SELECT * FROM blog_posts");
        filter
            .search(&["title", "author"], Some("rust"))
            .eq("status", Some("published".to_string()));
        let builder = filter.page("created_at DESC", 20, 0);

        assert_eq!(
            builder.sql(),
            "SELECT * FROM blog_posts WHERE (LOWER(title) LIKE ? ESCAPE '\\' OR LOWER(author) LIKE ? ESCAPE '\\') AND status = ? ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
    }

    #[test]
    fn array_columns_match_elements_not_json_text() {
        let mut filter = Filter::new("SELECT COUNT(*) FROM blog_posts");
        filter.search_with_arrays(&["title"], &["tags"], Some("ai"));

        assert_eq!(
            filter.into_builder().sql(),
            "SELECT COUNT(*) FROM blog_posts WHERE (LOWER(title) LIKE ? ESCAPE '\\' OR EXISTS (SELECT 1 FROM json_each(tags) WHERE LOWER(json_each.value) LIKE ? ESCAPE '\\'))"
        );
    }
}
