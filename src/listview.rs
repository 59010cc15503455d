use serde_json::Value;

/// One page of a filtered collection, plus the totals the UI needs to
/// render pagination controls.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleSlice {
    pub page_items: Vec<Value>,
    pub total_filtered: usize,
    pub total_pages: usize,
}

/// Per-resource list controller: the cached collection plus the current
/// filter parameters. Filtering and slicing are derived views and never
/// touch `items`; the cache changes only on load/create/update/delete.
#[derive(Debug)]
pub struct ListView {
    pub items: Vec<Value>,
    pub search_text: String,
    pub category_filter: String,
    pub current_page: usize,
    pub page_size: usize,
    pub loading: bool,
}

impl ListView {
    pub fn new(page_size: usize) -> Self {
        ListView {
            items: Vec::new(),
            search_text: String::new(),
            category_filter: "all".to_string(),
            current_page: 1,
            page_size,
            loading: false,
        }
    }

    /// Changing a filter always snaps back to page 1 so the user is never
    /// left on a page the shrunken result set no longer has.
    pub fn set_search_text(&mut self, text: &str) {
        self.search_text = text.to_string();
        self.current_page = 1;
    }

    pub fn set_category_filter(&mut self, value: &str) {
        self.category_filter = value.to_string();
        self.current_page = 1;
    }

    /// Pages start at 1. No upper clamp: an out-of-range page yields an
    /// empty slice and the caller decides whether to move back.
    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    /// Pure derived view: substring search OR-ed across `searchable` fields
    /// (case-insensitive), AND equality on `category_field` unless the
    /// filter is "all", then the slice for the current page.
    pub fn compute_visible(
        &self,
        searchable: &[&str],
        category_field: Option<&str>,
    ) -> VisibleSlice {
        let needle = self.search_text.to_lowercase();
        let filtered: Vec<&Value> = self
            .items
            .iter()
            .filter(|row| {
                let matches_search = needle.is_empty()
                    || searchable
                        .iter()
                        .any(|f| field_text(row, f).to_lowercase().contains(&needle));
                let matches_category = match category_field {
                    Some(cf) if self.category_filter != "all" => {
                        field_text(row, cf) == self.category_filter
                    }
                    _ => true,
                };
                matches_search && matches_category
            })
            .collect();

        let total_filtered = filtered.len();
        let total_pages = std::cmp::max(1, total_filtered.div_ceil(self.page_size));
        let start = (self.current_page - 1) * self.page_size;
        let page_items = filtered
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect();

        VisibleSlice {
            page_items,
            total_filtered,
            total_pages,
        }
    }
}

/// Field as searchable text. Numbers participate in search the way the
/// UI prints them; null/absent fields never match.
fn field_text(row: &Value, field: &str) -> String {
    match row.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
