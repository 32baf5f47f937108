//! Turns free-text addresses into geocoder search strings.
//!
//! Senders rarely type the city or state, so the search string gets a New
//! York suffix unless the text already carries enough context: a trailing
//! zip code, or both a city/borough name and a state marker.

use std::sync::LazyLock;

use regex::Regex;

/// Compile a pattern literal; the literals below are fixed and valid.
#[allow(clippy::expect_used)]
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("normalizer pattern must compile")
}

/// Text ends in five digits.
static ZIP_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"[0-9]{5}$"));

/// `NY 12345` in any case, `, NY`, or a trailing ` NY`.
///
/// Only the zip form is case-insensitive; a bare lowercase "ny" is too
/// common inside words to count.
static STATE_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        pattern(r"(?i)NY [0-9]{5}"),
        pattern(r",\s*NY"),
        pattern(r"\sNY$"),
    ]
});

/// Case-insensitive city and borough names.
static CITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)new york|brooklyn|queens|staten island|manhattan|bronx|nyc")
});

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\s"));

/// Appended when a city is present without a state.
const STATE_SUFFIX: &str = "+NY";
/// Appended when no city is present.
const CITY_STATE_SUFFIX: &str = "+New+York,+NY";

/// One inbound text and the search string derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub raw: String,
    pub normalized: String,
}

impl SearchQuery {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = search_string(&raw);
        Self { raw, normalized }
    }
}

/// Build the geocoder search string for `input`.
///
/// Whitespace becomes `+` one character at a time; runs are not collapsed.
#[must_use]
pub fn search_string(input: &str) -> String {
    let text = input.trim();
    let joined = WHITESPACE_RE.replace_all(text, "+").into_owned();

    let has_zip = ZIP_RE.is_match(text);
    let has_city = CITY_RE.is_match(text);
    let has_state = STATE_RES.iter().any(|re| re.is_match(text));

    if has_zip || (has_city && has_state) {
        joined
    } else if has_city {
        joined + STATE_SUFFIX
    } else {
        joined + CITY_STATE_SUFFIX
    }
}
