//! Inline option parsing for free-text locations.
//!
//! Users can tack `u:<unit>` and `l:<language>` onto a location, e.g.
//! `Chicago u:m l:es`. [`parse_location`] pulls those tokens out and returns
//! what is left as the location.

use regex::Regex;
use std::sync::LazyLock;

use crate::model::Units;

// A marker only counts as a standalone token: start/whitespace/comma before it,
// end/whitespace/comma after its value. Group 1 is the span that gets removed.
// Without a colon only lowercase `u` is a marker, so words like `Um` survive.
static UNITS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s,])((?:(?i:u):\s*|u)([umM]))(?:[\s,]|$)")
        .expect("valid units pattern")
});

// The colon is mandatory for languages, otherwise every word starting with `l`
// would be a candidate.
static LANGUAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s,])((?i:l):\s*([A-Za-z]+(?:-[A-Za-z]+)*))(?:[\s,]|$)")
        .expect("valid language pattern")
});

/// Result of [`parse_location`]. Built once per command and passed along.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLocation {
    /// `None` when nothing but options (or nothing at all) was given.
    pub location: Option<String>,
    pub units: Option<Units>,
    pub language: Option<String>,
}

/// Split a raw location argument into location text and inline options.
///
/// Unrecognized markers (`u:x`, a bare `l:`) are left in the location.
pub fn parse_location(raw: &str) -> ParsedLocation {
    let mut text = raw.to_string();

    let units =
        extract(&UNITS_RE, &mut text).and_then(|value| Units::try_from(value.as_str()).ok());
    let language = extract(&LANGUAGE_RE, &mut text);

    let cleaned = trim_location(&text);
    ParsedLocation {
        location: (!cleaned.is_empty()).then(|| cleaned.to_string()),
        units,
        language,
    }
}

/// Remove the first match of `re` from `text` and return its value group.
fn extract(re: &Regex, text: &mut String) -> Option<String> {
    let caps = re.captures(text.as_str())?;
    let token = caps.get(1)?.range();
    let value = caps.get(2)?.as_str().to_string();
    text.replace_range(token, "");
    Some(value)
}

fn trim_location(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix(',').unwrap_or(text);
    let text = text.strip_suffix(',').unwrap_or(text);
    text.trim()
}
