/// URL-safe, lowercased, hyphenated form of a display name.
///
/// Only ASCII letters, digits, whitespace and `-` survive; whitespace runs
/// become a single `-`. The result may be empty for names written entirely in
/// non-ASCII scripts, callers decide on a fallback.
pub fn slugify(name: &str) -> String {
    let filtered: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(filtered.len());
    for c in filtered.chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }

    slug.trim_matches('-').to_string()
}

/// Strips the last extension: `"holiday.photo.jpg"` -> `"holiday.photo"`.
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("My Holiday Photos"), "my-holiday-photos");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
        assert_eq!(slugify("a -- b"), "a-b");
    }

    #[test]
    fn test_slugify_strips_non_ascii_and_punctuation() {
        assert_eq!(slugify("Été 2024!"), "t-2024");
        assert_eq!(slugify("report_v2.final"), "reportv2final");
        assert_eq!(slugify("日本"), "");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("holiday.photo.jpg"), "holiday.photo");
        assert_eq!(file_stem("README"), "README");
        assert_eq!(file_stem(".bashrc"), ".bashrc");
    }
}
