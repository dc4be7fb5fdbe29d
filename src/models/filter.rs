use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Subject tag counted by the "Top 100" view.
pub const TOP_100_TAG: &str = "Top 100";

/// Filters accepted by the shuffled quote query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFilter {
    Author,
    Subject,
    Deleted,
}

impl QueryFilter {
    pub fn label(&self) -> &'static str {
        match self {
            QueryFilter::Author => "Author",
            QueryFilter::Subject => "Subject",
            QueryFilter::Deleted => "Recently Deleted",
        }
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QueryFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "author" => Ok(QueryFilter::Author),
            "subject" | "subjects" => Ok(QueryFilter::Subject),
            "deleted" | "recently deleted" => Ok(QueryFilter::Deleted),
            _ => Err(AppError::InvalidFilter(s.to_string())),
        }
    }
}

/// Views that can be counted. Superset of [`QueryFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountView {
    Author,
    Subject,
    All,
    Favorites,
    Contributed,
    Top100,
    Deleted,
}

impl CountView {
    /// Unknown labels yield `None`; callers count those as zero.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "author" => Some(CountView::Author),
            "subject" | "subjects" => Some(CountView::Subject),
            "all" | "all quotes" => Some(CountView::All),
            "favorites" => Some(CountView::Favorites),
            "contributed" | "added by me" => Some(CountView::Contributed),
            "top100" | "top 100" => Some(CountView::Top100),
            "deleted" | "recently deleted" => Some(CountView::Deleted),
            _ => None,
        }
    }
}

impl From<QueryFilter> for CountView {
    fn from(filter: QueryFilter) -> Self {
        match filter {
            QueryFilter::Author => CountView::Author,
            QueryFilter::Subject => CountView::Subject,
            QueryFilter::Deleted => CountView::Deleted,
        }
    }
}

/// Columns that feed the filter pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistinctColumn {
    Author,
    Subjects,
}

impl DistinctColumn {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "author" => Some(DistinctColumn::Author),
            "subject" | "subjects" => Some(DistinctColumn::Subjects),
            _ => None,
        }
    }

    pub(crate) fn column(&self) -> &'static str {
        match self {
            DistinctColumn::Author => "author",
            DistinctColumn::Subjects => "subjects",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_filter_parses_labels() {
        assert_eq!("Author".parse::<QueryFilter>().unwrap(), QueryFilter::Author);
        assert_eq!("subject".parse::<QueryFilter>().unwrap(), QueryFilter::Subject);
        assert_eq!(
            "Recently Deleted".parse::<QueryFilter>().unwrap(),
            QueryFilter::Deleted
        );
    }

    #[test]
    fn test_query_filter_rejects_unknown() {
        let err = "Color".parse::<QueryFilter>().unwrap_err();
        assert!(matches!(err, AppError::InvalidFilter(ref f) if f == "Color"));
    }

    #[test]
    fn test_count_view_unknown_is_none() {
        assert_eq!(CountView::parse("Top 100"), Some(CountView::Top100));
        assert_eq!(CountView::parse("Added by me"), Some(CountView::Contributed));
        assert_eq!(CountView::parse("nonsense"), None);
    }

    #[test]
    fn test_filter_label_round_trips() {
        for filter in [QueryFilter::Author, QueryFilter::Subject, QueryFilter::Deleted] {
            assert_eq!(filter.to_string().parse::<QueryFilter>().unwrap(), filter);
        }
    }
}
