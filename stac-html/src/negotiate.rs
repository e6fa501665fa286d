//! Content negotiation for HTML rendering.
//!
//! The output format is decided from two competing signals: the `f` query parameter,
//! which always wins when present, and the `Accept` header quality values.

/// Media type tokens that select an HTML rendering when found in the top preference tier.
const HTML_TOKENS: &[&str] = &["text/html", "*"];

/// Return the top tier of an `Accept`-style header.
///
/// Tokens are grouped by their `q` weight and the group with the highest weight is returned,
/// keeping the order in which the tokens were first seen.
/// A token weighted `0` is dropped, and so is a token with an unparsable weight.
///
/// Returns `None` if the header is empty or nothing survives the filtering,
/// which is different from a header that contains a single low-weight token.
///
/// See <https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/Accept>
#[must_use]
pub fn preferred_encoding(accept: &str) -> Option<Vec<String>> {
    let accept: String = accept.chars().filter(|c| !c.is_whitespace()).collect();

    let mut accepted: Vec<(&str, f64)> = Vec::new();
    for entry in accept.split(',').filter(|v| !v.is_empty()) {
        let mut pieces = entry.split(';');
        let Some(name) = pieces.next() else {
            continue;
        };
        let quality = parse_quality(pieces);
        if quality <= 0.0 {
            continue;
        }
        match accepted.iter_mut().find(|(n, _)| *n == name) {
            Some((_, q)) => *q = quality,
            None => accepted.push((name, quality)),
        }
    }

    let top = accepted
        .iter()
        .map(|(_, q)| *q)
        .max_by(f64::total_cmp)?;

    Some(
        accepted
            .into_iter()
            .filter(|(_, q)| q.total_cmp(&top).is_eq())
            .map(|(name, _)| name.to_string())
            .collect(),
    )
}

/// Read the `q` parameter out of the `key=value` pieces following a media type token.
///
/// Anything that is not a finite, positive number is treated as `0`.
fn parse_quality<'a>(params: impl Iterator<Item = &'a str>) -> f64 {
    let q = params
        .filter_map(|param| param.split_once('='))
        .filter(|(key, _)| *key == "q")
        .map(|(_, value)| value)
        .last();

    match q {
        None | Some("") => 1.0,
        Some(value) => match value.parse::<f64>() {
            Ok(q) if q.is_finite() && q > 0.0 => q,
            _ => 0.0,
        },
    }
}

/// What the response should be turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Render the JSON body with an HTML template.
    Html,
    /// Forward the response as produced by the API.
    Passthrough,
}

impl OutputFormat {
    /// Decide the output format of a response.
    ///
    /// `f=html` forces HTML. Any other non-empty `f` value forces pass-through,
    /// even when the `Accept` header would select HTML.
    /// Without `f`, HTML is selected if `text/html` or `*` is among the most preferred tokens.
    #[must_use]
    pub fn negotiate(format_param: Option<&str>, accept: Option<&str>) -> Self {
        match format_param {
            Some("html") => return Self::Html,
            Some(f) if !f.is_empty() => return Self::Passthrough,
            _ => {}
        }

        let preferred = accept.and_then(preferred_encoding).unwrap_or_default();
        if preferred
            .iter()
            .any(|token| HTML_TOKENS.contains(&token.as_str()))
        {
            Self::Html
        } else {
            Self::Passthrough
        }
    }

    #[must_use]
    pub fn is_html(self) -> bool {
        self == Self::Html
    }
}
