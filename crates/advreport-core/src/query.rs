//! Query state: filters, sort order and page, and their URL encoding.
//!
//! The location carries a flat string map. Two keys are reserved:
//! `page` (positive integer) and `order` (sort token, `-` prefix for
//! descending). Every other key is a filter passed verbatim to the backend.

use std::fmt;

pub const PAGE_KEY: &str = "page";
pub const ORDER_KEY: &str = "order";

// =============================================================================
// Query Params
// =============================================================================

/// Insertion-ordered string map of query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a `?a=b&c=d` string. The leading `?` is optional.
    pub fn parse(query_string: &str) -> Self {
        let trimmed = query_string.strip_prefix('?').unwrap_or(query_string);
        trimmed
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) => (percent_decode(k), percent_decode(v)),
                None => (percent_decode(pair), String::new()),
            })
            .collect()
    }

    /// Set a value. Existing keys keep their position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `?k=v&...` with each component URI-encoded; `?` alone when empty.
    pub fn to_query_string(&self) -> String {
        let pairs: Vec<String> = self
            .entries
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect();
        format!("?{}", pairs.join("&"))
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Percent-encode one URI component.
///
/// Leaves `A-Z a-z 0-9 - _ . ! ~ * ' ( )` as-is and escapes every other
/// byte as `%XX` (uppercase hex).
pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(b as char),
            _ => {
                out.push('%');
                out.push_str(&format!("{b:02X}"));
            }
        }
    }
    out
}

/// Decode `%XX` escapes and `+` as space. Malformed escapes pass through.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

// =============================================================================
// Sort Order
// =============================================================================

/// A sort field with direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    pub ascending: bool,
}

impl SortOrder {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }

    /// Decode an `order` token. Empty tokens carry no sort.
    pub fn parse(token: &str) -> Option<Self> {
        match token.strip_prefix('-') {
            Some("") => None,
            Some(field) => Some(Self::descending(field)),
            None if token.is_empty() => None,
            None => Some(Self::ascending(token)),
        }
    }

    /// The `order` token: `field` or `-field`.
    pub fn token(&self) -> String {
        if self.ascending {
            self.field.clone()
        } else {
            format!("-{}", self.field)
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

// =============================================================================
// Query State
// =============================================================================

/// Canonical filter/sort/page state of a report view.
///
/// Replaced wholesale on every change; the `with_*` methods return new
/// values and never patch in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    filters: QueryParams,
    sort: Option<SortOrder>,
    page: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            filters: QueryParams::new(),
            sort: None,
            page: 1,
        }
    }
}

impl QueryState {
    /// Build from location parameters. `None` values are dropped.
    ///
    /// `page` is parsed as an integer (falling back to 1), `order` becomes
    /// the sort, and every remaining key becomes a filter.
    pub fn from_external_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut state = QueryState::default();
        for (key, value) in params {
            let Some(value) = value else { continue };
            let key = key.into();
            let value = value.into();
            match key.as_str() {
                PAGE_KEY => state.page = value.trim().parse::<u32>().unwrap_or(1).max(1),
                ORDER_KEY => state.sort = SortOrder::parse(&value),
                _ => state.filters.insert(key, value),
            }
        }
        state
    }

    /// Build from a fully-present parameter map.
    pub fn from_params(params: &QueryParams) -> Self {
        Self::from_external_params(params.iter().map(|(k, v)| (k, Some(v))))
    }

    pub fn filters(&self) -> &QueryParams {
        &self.filters
    }

    pub fn sort(&self) -> Option<&SortOrder> {
        self.sort.as_ref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Re-merged parameter map: `order`, then filters, then `page`.
    pub fn params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if let Some(sort) = &self.sort {
            params.insert(ORDER_KEY, sort.token());
        }
        for (k, v) in self.filters.iter() {
            params.insert(k, v);
        }
        params.insert(PAGE_KEY, self.page.to_string());
        params
    }

    pub fn to_query_string(&self) -> String {
        self.params().to_query_string()
    }

    /// Move to page `n`.
    ///
    /// Returns `None` (no change, nothing to fetch) when `n` is 0, beyond
    /// `page_count`, or already the current page.
    pub fn with_page(&self, n: u32, page_count: u32) -> Option<Self> {
        if n < 1 || n > page_count || n == self.page {
            return None;
        }
        Some(Self {
            page: n,
            ..self.clone()
        })
    }

    /// Sort by `field`, toggling direction against this state's own sort.
    pub fn with_sort(&self, field: &str) -> Self {
        self.toggle_sort(field, self.sort.as_ref())
    }

    /// Sort by `field`, toggling direction against `active`.
    ///
    /// Only a currently ascending sort on the same field flips to
    /// descending; anything else sorts ascending. Always resets to page 1.
    pub fn toggle_sort(&self, field: &str, active: Option<&SortOrder>) -> Self {
        let ascending = match active {
            Some(current) => current.field != field || !current.ascending,
            None => true,
        };
        Self {
            filters: self.filters.clone(),
            sort: Some(SortOrder {
                field: field.to_string(),
                ascending,
            }),
            page: 1,
        }
    }

    /// Replace all filters with `pending`, keeping the sort, on page 1.
    pub fn apply_pending_filters(&self, pending: &QueryParams) -> Self {
        let filters = pending
            .iter()
            .filter(|(k, _)| *k != PAGE_KEY && *k != ORDER_KEY)
            .collect();
        Self {
            filters,
            sort: self.sort.clone(),
            page: 1,
        }
    }

    /// Drop all filters, keeping the sort, on page 1.
    pub fn clear_filters(&self) -> Self {
        Self {
            filters: QueryParams::new(),
            sort: self.sort.clone(),
            page: 1,
        }
    }
}
