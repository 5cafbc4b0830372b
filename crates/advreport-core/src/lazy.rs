//! Lazy-content directives embedded in expanded-row markup.
//!
//! The backend rewrites `data-method="..."` attributes in an item's extra
//! information into binding attributes of the form
//! `ng-bind-html-unsafe="lazydiv__<item id>__<method>"`. The markup is
//! backend-generated and trusted, so decoding is a plain split on the
//! attribute marker rather than a markup parse.

/// Attribute prefix that opens a directive token.
pub const DIRECTIVE_MARKER: &str = "ng-bind-html-unsafe=\"";

/// Token kind that requests lazy content.
pub const LAZY_KIND: &str = "lazydiv";

const SEPARATOR: &str = "__";

/// A decoded `lazydiv__<id>__<method>` token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LazyDirective {
    /// The full token; lazy results are stored under this key.
    pub token: String,
    pub item_id: String,
    pub method: String,
}

impl LazyDirective {
    /// Decode a single token. Returns `None` for tokens of any other kind.
    ///
    /// Only the third `__` segment names the method; anything after it is
    /// ignored.
    pub fn parse(token: &str) -> Option<Self> {
        let mut parts = token.split(SEPARATOR);
        if parts.next()? != LAZY_KIND {
            return None;
        }
        let item_id = parts.next()?;
        let method = parts.next()?;

        Some(Self {
            token: token.to_string(),
            item_id: item_id.to_string(),
            method: method.to_string(),
        })
    }

    /// Every lazy directive in `markup`, in document order.
    pub fn extract(markup: &str) -> Vec<Self> {
        markup
            .split(DIRECTIVE_MARKER)
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .filter_map(Self::parse)
            .collect()
    }

    /// Content URL relative to `base`: `<base>action/<method>/<item id>/`.
    pub fn url(&self, base: &str) -> String {
        format!("{}action/{}/{}/", base, self.method, self.item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directive() {
        let d = LazyDirective::parse("lazydiv__12__history").unwrap();
        assert_eq!(d.item_id, "12");
        assert_eq!(d.method, "history");
        assert_eq!(d.token, "lazydiv__12__history");
    }

    #[test]
    fn test_parse_ignores_trailing_segments() {
        let d = LazyDirective::parse("lazydiv__12__history__v2").unwrap();
        assert_eq!(d.method, "history");
        assert_eq!(d.token, "lazydiv__12__history__v2");
        assert_eq!(d.url("/r/"), "/r/action/history/12/");
    }

    #[test]
    fn test_parse_rejects_other_kinds() {
        assert!(LazyDirective::parse("item.name").is_none());
        assert!(LazyDirective::parse("lazydiv__12").is_none());
    }

    #[test]
    fn test_extract_from_markup() {
        let markup = concat!(
            "<div ng-bind-html-unsafe=\"lazydiv__3__history\"></div>",
            "<p>static</p>",
            "<span ng-bind-html-unsafe=\"item.label\"></span>",
            "<div ng-bind-html-unsafe=\"lazydiv__3__notes\"></div>",
        );

        let found = LazyDirective::extract(markup);
        let methods: Vec<_> = found.iter().map(|d| d.method.as_str()).collect();
        assert_eq!(methods, vec!["history", "notes"]);
    }

    #[test]
    fn test_extract_empty_markup() {
        assert!(LazyDirective::extract("").is_empty());
        assert!(LazyDirective::extract("<b>no directives</b>").is_empty());
    }

    #[test]
    fn test_url_layout() {
        let d = LazyDirective::parse("lazydiv__7__log").unwrap();
        assert_eq!(d.url("/reports/orders/"), "/reports/orders/action/log/7/");
    }
}
