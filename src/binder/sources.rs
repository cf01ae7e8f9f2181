use std::borrow::Cow;

use crate::descriptor::BindingSource;

/// Raw values a transport hands to the binder.
///
/// Holds owned data only so that any framework can build one. Keys are
/// looked up ASCII-case-insensitively, an exact match winning over a folded
/// one. A query key that repeats yields its values joined with `,`.
///
/// # Examples
///
/// ```
/// use dispatch_core::ValueSources;
///
/// let sources = ValueSources::new()
///     .with_route_value("Id", "abc123")
///     .with_query_value("tag", "a")
///     .with_query_value("tag", "b")
///     .with_body(r#"{"Name":"Admin"}"#);
///
/// assert_eq!(sources.route_value("id"), Some("abc123"));
/// assert_eq!(sources.query_value("TAG").as_deref(), Some("a,b"));
/// assert!(sources.has_body());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueSources {
    route: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ValueSources {
    /// Creates an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route value, replacing any with the same key.
    pub fn with_route_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_route_value(key, value);
        self
    }

    /// Adds a query value. Repeated keys accumulate.
    pub fn with_query_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_query_value(key, value);
        self
    }

    /// Sets the raw body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.set_body(body);
        self
    }

    /// Adds a route value in place, replacing any with the same key.
    pub fn add_route_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.route.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.route.push((key, value)),
        }
    }

    /// Adds a query value in place.
    pub fn add_query_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push((key.into(), value.into()));
    }

    /// Replaces the raw body in place.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    /// Looks up a route value.
    pub fn route_value(&self, key: &str) -> Option<&str> {
        self.route
            .iter()
            .find(|(k, _)| k == key)
            .or_else(|| self.route.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)))
            .map(|(_, v)| v.as_str())
    }

    /// Looks up a query value, joining repeats with `,`.
    pub fn query_value(&self, key: &str) -> Option<Cow<'_, str>> {
        let exact: Vec<&str> = self
            .query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect();
        let values = if exact.is_empty() {
            self.query
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_str())
                .collect()
        } else {
            exact
        };

        match values.as_slice() {
            [] => None,
            [single] => Some(Cow::Borrowed(*single)),
            many => Some(Cow::Owned(many.join(","))),
        }
    }

    /// Raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether the body holds anything other than whitespace.
    pub fn has_body(&self) -> bool {
        self.body.iter().any(|b| !b.is_ascii_whitespace())
    }

    /// Value for `key` from a URL source. Body values are never looked up
    /// here; the body is decoded as a whole.
    pub(crate) fn url_value(&self, source: BindingSource, key: &str) -> Option<Cow<'_, str>> {
        match source {
            BindingSource::Route => self.route_value(key).map(Cow::Borrowed),
            BindingSource::Query => self.query_value(key),
            BindingSource::Body => None,
        }
    }

    /// Overlays the values captured by route resolution. A captured value
    /// replaces every supplied value whose key differs only in case.
    pub(crate) fn merge_route_values(&mut self, captured: Vec<(String, String)>) {
        for (key, value) in captured {
            self.route.retain(|(k, _)| !k.eq_ignore_ascii_case(&key));
            self.route.push((key, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_key_wins_over_folded_key() {
        let sources = ValueSources::new()
            .with_route_value("id", "lower")
            .with_route_value("ID", "upper");
        assert_eq!(sources.route_value("ID"), Some("upper"));
        assert_eq!(sources.route_value("id"), Some("lower"));
        assert_eq!(sources.route_value("Id"), Some("lower"));
    }

    #[test]
    fn route_values_replace_same_key() {
        let mut sources = ValueSources::new().with_route_value("id", "1");
        sources.merge_route_values(vec![("id".to_string(), "2".to_string())]);
        assert_eq!(sources.route_value("id"), Some("2"));
    }

    #[test]
    fn captured_values_replace_keys_differing_in_case() {
        let mut sources = ValueSources::new()
            .with_route_value("id", "stale")
            .with_route_value("ID", "staler")
            .with_route_value("tenant", "t1");
        sources.merge_route_values(vec![("Id".to_string(), "from-path".to_string())]);
        assert_eq!(sources.route_value("id"), Some("from-path"));
        assert_eq!(sources.route_value("ID"), Some("from-path"));
        assert_eq!(sources.route_value("tenant"), Some("t1"));
    }

    #[test]
    fn missing_keys_are_absent() {
        let sources = ValueSources::new();
        assert_eq!(sources.route_value("id"), None);
        assert_eq!(sources.query_value("id"), None);
        assert!(!sources.has_body());
    }

    #[test]
    fn whitespace_body_counts_as_empty() {
        let sources = ValueSources::new().with_body(" \n\t ");
        assert!(!sources.has_body());
    }

    #[test]
    fn url_value_never_reads_the_body() {
        let sources = ValueSources::new()
            .with_query_value("name", "q")
            .with_body(r#"{"name":"b"}"#);
        assert_eq!(
            sources.url_value(BindingSource::Query, "name").as_deref(),
            Some("q")
        );
        assert_eq!(sources.url_value(BindingSource::Body, "name"), None);
    }
}
