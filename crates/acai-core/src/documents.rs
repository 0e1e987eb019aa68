//! Client-side document listing: filters, ordering, page search, and citation text.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use acai_types::wire::parse_timestamp;
use acai_types::{Document, DocumentPage};

/// Field documents are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    CreatedAt,
    Filename,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "created_at" | "created" | "date" => Ok(Self::CreatedAt),
            "filename" | "name" => Ok(Self::Filename),
            _ => Err(format!(
                "Unknown sort field '{value}'. Valid options: created_at, filename"
            )),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortBy::CreatedAt => f.write_str("created_at"),
            SortBy::Filename => f.write_str("filename"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("Unknown sort order '{value}'. Valid options: asc, desc")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

/// Filters and ordering for a document listing.
///
/// Empty filter fields match everything. Defaults to newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    /// Exact `file_type` match (e.g. `.pdf`).
    pub file_type: Option<String>,
    /// Exact `status` match.
    pub status: Option<String>,
    /// Prefix of `created_at` (e.g. `2024-05` or `2024-05-01`).
    pub date: Option<String>,
    /// Case-insensitive filename substring.
    pub search: Option<String>,
    pub sort_by: SortBy,
    pub order: SortOrder,
}

impl DocumentQuery {
    /// Returns the matching documents in the requested order.
    pub fn apply(&self, documents: &[Document]) -> Vec<Document> {
        let search = non_empty(self.search.as_deref()).map(str::to_lowercase);
        let mut result: Vec<Document> = documents
            .iter()
            .filter(|doc| {
                non_empty(self.file_type.as_deref()).is_none_or(|t| doc.file_type == t)
            })
            .filter(|doc| non_empty(self.status.as_deref()).is_none_or(|s| doc.status == s))
            .filter(|doc| {
                non_empty(self.date.as_deref())
                    .is_none_or(|d| !doc.created_at.is_empty() && doc.created_at.starts_with(d))
            })
            .filter(|doc| {
                search
                    .as_deref()
                    .is_none_or(|q| doc.filename.to_lowercase().contains(q))
            })
            .cloned()
            .collect();

        result.sort_by(|a, b| {
            let ordering = match self.sort_by {
                SortBy::CreatedAt => compare_created(a, b),
                SortBy::Filename => a.filename.to_lowercase().cmp(&b.filename.to_lowercase()),
            };
            match self.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        result
    }
}

/// Unparseable timestamps sort before any valid one.
fn compare_created(a: &Document, b: &Document) -> Ordering {
    parse_timestamp(&a.created_at).cmp(&parse_timestamp(&b.created_at))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Pages whose content contains `query` (case-insensitive). Empty query keeps all.
pub fn filter_pages<'a>(pages: &'a [DocumentPage], query: &str) -> Vec<&'a DocumentPage> {
    let query = query.trim().to_lowercase();
    pages
        .iter()
        .filter(|page| query.is_empty() || page.content.to_lowercase().contains(&query))
        .collect()
}

/// Appends a source reference for `page` of `document` to `text`.
pub fn cite(text: &str, page: &DocumentPage, document: &Document) -> String {
    format!(
        "{text}\n\nSource: {}, page {}",
        document.filename, page.page_number
    )
}
