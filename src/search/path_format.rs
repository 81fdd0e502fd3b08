//! Normalisation of requested field paths.
//!
//! Clients send paths in three notations besides plain dotted form:
//!
//! ```text
//! data.book.title          wrapper prefix, stripped through the marker
//! book/Author.name         slash notation: book.name
//! book_Author.name         underscore notation: book.name
//! ```
//!
//! `/` and `_` reduce the same way and may be mixed. Formatted paths carry
//! neither delimiter, so formatting is idempotent.

/// Field names that request pagination metadata instead of entity data
pub const PAGE_METADATA_FIELDS: [&str; 5] = [
    "currentPage",
    "pageSize",
    "totalPages",
    "currentPageCount",
    "total",
];

#[derive(Debug, Clone)]
pub struct PathFormatter {
    wrapper_marker: String,
}

impl PathFormatter {
    pub fn new(wrapper_marker: impl Into<String>) -> Self {
        Self {
            wrapper_marker: wrapper_marker.into(),
        }
    }

    /// Normalise one path to dotted form
    pub fn format(&self, path: &str) -> String {
        let dotted = if path.contains(['/', '_']) {
            Self::join_typed_segments(path.split(['/', '_']).collect())
        } else {
            path.to_string()
        };
        self.strip_wrapper(&dotted)
    }

    /// True for a formatted path that is exactly a pagination metadata name.
    ///
    /// `data.total` formats to `total` and matches; `book.total` names an
    /// attribute and does not.
    pub fn is_metadata(path: &str) -> bool {
        PAGE_METADATA_FIELDS.contains(&path)
    }

    // The first segment is kept whole; later ones are `Type.attribute` and
    // contribute only the attribute.
    fn join_typed_segments(parts: Vec<&str>) -> String {
        parts
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_empty())
            .map(|(i, p)| if i == 0 { *p } else { p.rsplit('.').next().unwrap_or(p) })
            .collect::<Vec<_>>()
            .join(".")
    }

    fn strip_wrapper(&self, path: &str) -> String {
        if self.wrapper_marker.is_empty() {
            return path.to_string();
        }
        let segments: Vec<&str> = path.split('.').collect();
        match segments.iter().rposition(|s| *s == self.wrapper_marker) {
            Some(pos) if pos + 1 < segments.len() => segments[pos + 1..].join("."),
            _ => path.to_string(),
        }
    }
}

impl Default for PathFormatter {
    fn default() -> Self {
        Self::new("data")
    }
}
