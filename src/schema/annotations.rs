//! Typed annotations parsed once from model documentation.
//!
//! Documentation lines such as
//!
//! ```text
//! A blog post.
//! @route("/articles")
//! @skip
//! ```
//!
//! become [`Annotation`] values attached to the [`Model`](super::Model) at load
//! time. Generators only ever read the parsed list.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::Annotation;

#[allow(clippy::expect_used)]
static ANNOTATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(?:^|\s)@([A-Za-z_][A-Za-z0-9_.]*)(?:\(([^)]*)\))?")
        .expect("annotation regex should be valid")
});

/// Parse every `@key` / `@key(arg, ...)` occurrence in a documentation string.
pub fn parse_annotations(documentation: &str) -> Vec<Annotation> {
    ANNOTATION_REGEX
        .captures_iter(documentation)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str().to_string();
            let args = caps
                .get(2)
                .map(|m| split_args(m.as_str()))
                .unwrap_or_default();
            Some(Annotation { key, args })
        })
        .collect()
}

fn split_args(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| a.trim_matches(|c| c == '"' || c == '\'').to_string())
        .collect()
}
