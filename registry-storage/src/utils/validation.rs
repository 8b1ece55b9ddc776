use regex::Regex;

/// Bucket names use lowercase letters, digits, `-`, `_` and `.`, and start
/// and end with a letter or digit. Names without dots are 3-63 characters;
/// dotted names may reach 222 with every dot-separated part at most 63.
pub fn is_valid_bucket_name(name: &str) -> bool {
    let re = Regex::new(r"^[a-z0-9][a-z0-9._-]*[a-z0-9]$").unwrap();
    if name.len() < 3 || !re.is_match(name) || name.contains("..") {
        return false;
    }
    if name.contains('.') {
        name.len() <= 222 && name.split('.').all(|part| part.len() <= 63)
    } else {
        name.len() <= 63
    }
}

/// Treats empty (or all-whitespace) values as unset, so that an exported but
/// blank variable does not select a credential strategy.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
