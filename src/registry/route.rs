//! `{param}` route templates.
//!
//! Templates and concrete paths are split on `/` with empty segments dropped,
//! so leading, trailing and doubled slashes never matter. Literal segments
//! compare ASCII-case-insensitively.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route template such as `/role/update/{Id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RouteTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl RouteTemplate {
    /// Parses a template. The error is the reason the template is malformed.
    pub(crate) fn parse(raw: &str) -> Result<Self, String> {
        if !raw.starts_with('/') {
            return Err("route must start with '/'".to_string());
        }

        let mut segments = Vec::new();
        for part in raw.split('/').filter(|p| !p.is_empty()) {
            if !part.contains(['{', '}']) {
                segments.push(Segment::Literal(part.to_string()));
                continue;
            }

            let name = part
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
                .ok_or_else(|| format!("segment '{part}' must be a whole '{{name}}' placeholder"))?;
            if name.is_empty() {
                return Err("placeholder name must not be empty".to_string());
            }
            if name.contains(['{', '}']) {
                return Err(format!("segment '{part}' has unbalanced braces"));
            }
            let duplicate = segments
                .iter()
                .any(|s| matches!(s, Segment::Param(p) if p.eq_ignore_ascii_case(name)));
            if duplicate {
                return Err(format!("placeholder '{name}' appears more than once"));
            }
            segments.push(Segment::Param(name.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.raw
    }

    /// A key equal for every equivalent template: literals lowercased,
    /// placeholders anonymous.
    pub(crate) fn shape_key(&self) -> String {
        let mut key = String::new();
        for segment in &self.segments {
            key.push('/');
            match segment {
                Segment::Literal(lit) => key.push_str(&lit.to_ascii_lowercase()),
                Segment::Param(_) => key.push_str("{}"),
            }
        }
        if key.is_empty() {
            key.push('/');
        }
        key
    }

    /// The shape an all-literal template for `path` would have.
    pub(crate) fn literal_shape(path: &str) -> String {
        let mut key = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            key.push('/');
            key.push_str(&part.to_ascii_lowercase());
        }
        if key.is_empty() {
            key.push('/');
        }
        key
    }

    pub(crate) fn has_param(&self, name: &str) -> bool {
        self.params().any(|p| p.eq_ignore_ascii_case(name))
    }

    pub(crate) fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Number of literal segments; more literals means a more specific template.
    pub(crate) fn specificity(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Matches a concrete path, returning the captured placeholder values.
    pub(crate) fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut captured = Vec::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit.eq_ignore_ascii_case(part) => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => captured.push((name.clone(), part.to_string())),
            }
        }
        Some(captured)
    }
}

impl fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
