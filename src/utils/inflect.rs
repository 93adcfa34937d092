//! Identifier humanization
//!
//! Turns code identifiers (`shouldFindTheUser`, `should_find_the_user`)
//! into readable titles and snapshot-friendly file names.

/// Convert an identifier to lowercase underscore form.
///
/// Camel-case boundaries become underscores; existing underscores and
/// spaces are preserved as single underscores.
pub fn underscore(identifier: &str) -> String {
    let mut result = String::with_capacity(identifier.len() + 4);
    let mut prev_lower = false;
    for c in identifier.chars() {
        if c.is_uppercase() {
            if prev_lower {
                result.push('_');
            }
            for lower in c.to_lowercase() {
                result.push(lower);
            }
            prev_lower = false;
        } else if c == ' ' || c == '_' || c == '-' {
            if !result.ends_with('_') {
                result.push('_');
            }
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    result.trim_matches('_').to_string()
}

/// Turn an identifier into a human-readable sentence: first word
/// capitalized, the rest lowercase, words separated by single spaces.
pub fn humanize(identifier: &str) -> String {
    let words: Vec<String> = underscore(identifier)
        .split('_')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();

    let mut sentence = words.join(" ");
    if let Some(first) = sentence.get(0..1) {
        let capitalized = first.to_uppercase();
        sentence.replace_range(0..1, &capitalized);
    }
    sentence
}
