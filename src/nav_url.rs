//! Navigation URL value type.
//!
//! # Responsibilities
//! - Hold the router's notion of "where the app is": path segments + parameters
//! - Parse and print the `/a/b?x=1` form
//! - Derive neighbouring URLs for relative transitions (push/pop)
//!
//! # Design Decisions
//! - Immutable value, structural equality
//! - Empty segments are dropped, so `//a/` and `/a` are the same URL
//! - Parameters are a sorted map; repeated query keys keep the last value
//! - Segments are stored decoded and percent-encoded on output, so any
//!   segment value survives a print/parse round trip

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Characters escaped inside a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A navigation URL: ordered path segments plus a parameter map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct NavUrl {
    segments: Vec<String>,
    params: BTreeMap<String, String>,
}

impl NavUrl {
    /// The empty URL ("no screens").
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a URL from segments, without parameters.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
            params: BTreeMap::new(),
        }
    }

    /// Parse `"/a/b?x=1&y=2"`.
    pub fn parse(input: &str) -> Self {
        let input = input.split_once('#').map_or(input, |(before, _)| before);
        let (path, query) = match input.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (input, None),
        };

        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect();
        let params = query
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self { segments, params }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// True when the URL has no path segments. Parameters are ignored.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of path segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// A copy of this URL with `segments` appended to the path.
    pub fn appending<I, S>(&self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        next.segments.extend(
            segments
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty()),
        );
        next
    }

    /// A copy of this URL with the last `count` segments removed.
    /// Popping past the root yields an empty path.
    pub fn popping(&self, count: usize) -> Self {
        let mut next = self.clone();
        let keep = next.segments.len().saturating_sub(count);
        next.segments.truncate(keep);
        next
    }

    /// A copy of this URL with one parameter set (overwriting).
    pub fn with_param(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.params.insert(name.into(), value.into());
        next
    }

    /// A copy of this URL with `params` merged on top of the existing ones.
    pub fn with_params<I, K, V>(&self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut next = self.clone();
        next.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        next
    }

    /// A copy of this URL with all parameters dropped.
    pub fn without_params(&self) -> Self {
        Self {
            segments: self.segments.clone(),
            params: BTreeMap::new(),
        }
    }

    /// True when `prefix`'s segments are a prefix of this URL's segments.
    pub fn starts_with(&self, prefix: &NavUrl) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl fmt::Display for NavUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", utf8_percent_encode(segment, SEGMENT))?;
        }
        if !self.params.is_empty() {
            let mut query = form_urlencoded::Serializer::new(String::new());
            for (name, value) in &self.params {
                query.append_pair(name, value);
            }
            write!(f, "?{}", query.finish())?;
        }
        Ok(())
    }
}

impl FromStr for NavUrl {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for NavUrl {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for NavUrl {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<NavUrl> for String {
    fn from(url: NavUrl) -> Self {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_and_query() {
        let url = NavUrl::parse("/list/42?sort=asc&page=2");
        assert_eq!(url.segments(), &["list".to_string(), "42".to_string()]);
        assert_eq!(url.param("sort"), Some("asc"));
        assert_eq!(url.param("page"), Some("2"));
        assert_eq!(url.depth(), 2);
    }

    #[test]
    fn test_empty_segments_are_dropped() {
        assert_eq!(NavUrl::parse("//a///b/"), NavUrl::parse("/a/b"));
        assert!(NavUrl::parse("/").is_empty());
        assert!(NavUrl::parse("").is_empty());
        assert_eq!(NavUrl::parse(""), NavUrl::empty());
    }

    #[test]
    fn test_repeated_query_key_last_wins() {
        let url = NavUrl::parse("/a?x=1&x=2");
        assert_eq!(url.param("x"), Some("2"));
    }

    #[test]
    fn test_display_is_canonical() {
        let url = NavUrl::parse("/a/b?z=last&a=first%20word");
        assert_eq!(url.to_string(), "/a/b?a=first+word&z=last");
        assert_eq!(NavUrl::empty().to_string(), "/");

        // Printing and reparsing yields the same value.
        assert_eq!(NavUrl::parse(&url.to_string()), url);
    }

    #[test]
    fn test_reserved_characters_in_segments_round_trip() {
        let url = NavUrl::from_segments(["search", "a?b=1", "x/y", "50% #1"]);
        assert_eq!(url.to_string(), "/search/a%3Fb=1/x%2Fy/50%25%20%231");

        let back = NavUrl::parse(&url.to_string());
        assert_eq!(back, url);
        assert!(back.params().is_empty());

        let json = serde_json::to_string(&url).unwrap();
        assert_eq!(serde_json::from_str::<NavUrl>(&json).unwrap(), url);
    }

    #[test]
    fn test_segments_are_decoded_like_query_values() {
        let url = NavUrl::parse("/users/john%20doe?n=john%20doe");
        assert_eq!(url.segments()[1], "john doe");
        assert_eq!(url.param("n"), Some("john doe"));
    }

    #[test]
    fn test_fragment_is_ignored() {
        assert_eq!(NavUrl::parse("/a?x=1#section"), NavUrl::parse("/a?x=1"));
    }

    #[test]
    fn test_relative_helpers() {
        let url = NavUrl::parse("/home/list?x=1");
        assert_eq!(url.appending(["item", "7"]).to_string(), "/home/list/item/7?x=1");
        assert_eq!(url.popping(1).to_string(), "/home?x=1");
        assert!(url.popping(5).is_empty());
        assert_eq!(url.popping(5).param("x"), Some("1"));
        assert!(url.starts_with(&NavUrl::parse("/home")));
        assert!(!url.starts_with(&NavUrl::parse("/list")));
        assert!(url.without_params().params().is_empty());
    }

    #[test]
    fn test_params_do_not_depend_on_order() {
        assert_eq!(NavUrl::parse("/a?x=1&y=2"), NavUrl::parse("/a?y=2&x=1"));
    }

    #[test]
    fn test_serde_as_string() {
        let url = NavUrl::parse("/list/42?tab=info");
        let json = serde_json::to_string(&url).unwrap();
        assert_eq!(json, "\"/list/42?tab=info\"");
        let back: NavUrl = serde_json::from_str(&json).unwrap();
        assert_eq!(back, url);
    }
}
