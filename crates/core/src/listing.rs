//! Marker-based listing model
//!
//! Listings are fetched one page at a time. A page holding exactly `limit`
//! items may be followed by more; the next request continues from the last
//! item's name (the marker). A shorter page, including an empty one, ends
//! the listing.

/// Anything that can act as a listing cursor
pub trait Named {
    fn name(&self) -> Option<&str>;
}

/// Options for a single listing request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Page size; `None` lets the service decide (unbounded)
    pub limit: Option<u32>,
    /// Name of the last item seen; empty or `None` starts from the beginning
    pub marker: Option<String>,
}

impl ListOptions {
    pub fn new(limit: Option<u32>) -> Self {
        Self {
            limit,
            marker: None,
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    /// Query string `?format=json[&limit=N][&marker=M]`
    pub fn query_string(&self) -> String {
        let mut query = String::from("?format=json");
        if let Some(limit) = self.limit {
            query.push_str(&format!("&limit={limit}"));
        }
        if let Some(marker) = self.marker.as_deref().filter(|m| !m.is_empty()) {
            query.push_str("&marker=");
            query.push_str(&urlencoding::encode(marker));
        }
        query
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage<T> {
    pub items: Vec<T>,
    pub limit: Option<u32>,
}

impl<T> ListingPage<T> {
    pub fn new(items: Vec<T>, limit: Option<u32>) -> Self {
        Self { items, limit }
    }

    pub fn empty(limit: Option<u32>) -> Self {
        Self::new(Vec::new(), limit)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the page is full, meaning more data may follow
    pub fn may_have_more(&self) -> bool {
        match self.limit {
            Some(limit) => limit > 0 && self.items.len() == limit as usize,
            None => false,
        }
    }
}

impl<T: Named> ListingPage<T> {
    /// Marker for the next request, if the page is full
    ///
    /// A final page of exactly `limit` items still yields a marker; the
    /// following request then returns an empty page.
    pub fn next_marker(&self) -> Option<String> {
        if !self.may_have_more() {
            return None;
        }
        self.items
            .last()
            .and_then(|item| item.name())
            .map(str::to_string)
    }
}

impl<T> IntoIterator for ListingPage<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
