//! SQL utility functions

use regex::Regex;

/// Translate a SQL LIKE pattern into an anchored, case-insensitive regex
///
/// `%` matches any run of characters and `_` exactly one; everything else is
/// literal.
///
/// # Example
///
/// ```
/// use bridge_server::utils::sql::like_to_regex;
///
/// let re = like_to_regex("jo%_n").unwrap();
/// assert!(re.is_match("JOHAN"));
/// assert!(!re.is_match("jon"));
/// ```
pub fn like_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut source = String::from("(?is)^");
    let mut buf = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            c => source.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    source.push('$');
    Regex::new(&source)
}

/// Whether `text` matches the LIKE pattern, ignoring case.
/// `None` when the pattern exceeds the regex size limit.
pub fn like_matches(pattern: &str, text: &str) -> Option<bool> {
    like_to_regex(pattern).ok().map(|re| re.is_match(text))
}
