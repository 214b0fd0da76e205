/// Input validation shared by the part and slug store operations.
///
/// Length limits follow the storage column widths in `constants`.
use crate::constants::{MAX_LANG_LEN, MAX_MODEL_NAME_LEN, MAX_PART_NAME_LEN, MAX_SLUG_NAME_LEN};

/// Part names key a namespace: 1-200 chars, no whitespace.
pub fn validate_part_name(name: &str) -> Result<(), &'static str> {
    let char_count = name.chars().count();
    if char_count == 0 {
        return Err("part name must not be empty");
    }
    if char_count > MAX_PART_NAME_LEN {
        return Err("part name must not exceed 200 characters");
    }
    if name.chars().any(char::is_whitespace) {
        return Err("part name must not contain whitespace");
    }
    Ok(())
}

/// Model tags are informational: 1-200 chars.
pub fn validate_model_name(model: &str) -> Result<(), &'static str> {
    let char_count = model.chars().count();
    if char_count == 0 {
        return Err("model tag must not be empty");
    }
    if char_count > MAX_MODEL_NAME_LEN {
        return Err("model tag must not exceed 200 characters");
    }
    Ok(())
}

/// Slug names: 1-200 chars. Any character is allowed; the name is the final
/// segment of its index key, so separators in it are unambiguous.
pub fn validate_slug_name(name: &str) -> Result<(), &'static str> {
    let char_count = name.chars().count();
    if char_count == 0 {
        return Err("slug name must not be empty");
    }
    if char_count > MAX_SLUG_NAME_LEN {
        return Err("slug name must not exceed 200 characters");
    }
    Ok(())
}

/// Language tags: 1-7 chars, lowercase ASCII letters, digits and hyphens
/// (ISO 639-1 plus specials such as "all" or "pt-br"). Appears mid-key in
/// the name index, so the charset must exclude the ':' separator.
pub fn validate_lang(lang: &str) -> Result<(), &'static str> {
    if lang.is_empty() {
        return Err("language tag must not be empty");
    }
    if lang.len() > MAX_LANG_LEN {
        return Err("language tag must not exceed 7 characters");
    }
    if !lang
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err("language tag must contain only lowercase letters, digits and hyphens");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_part_name_accepted() {
        assert!(validate_part_name("article").is_ok());
    }

    #[test]
    fn empty_part_name_rejected() {
        assert!(validate_part_name("").is_err());
    }

    #[test]
    fn whitespace_part_name_rejected() {
        assert!(validate_part_name("news article").is_err());
    }

    #[test]
    fn overlong_part_name_rejected() {
        assert!(validate_part_name(&"a".repeat(201)).is_err());
    }

    #[test]
    fn slug_name_allows_separators() {
        assert!(validate_slug_name("my:post/2026").is_ok());
    }

    #[test]
    fn overlong_slug_name_rejected() {
        assert!(validate_slug_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn valid_langs_accepted() {
        assert!(validate_lang("en").is_ok());
        assert!(validate_lang("all").is_ok());
        assert!(validate_lang("pt-br").is_ok());
    }

    #[test]
    fn bad_langs_rejected() {
        assert!(validate_lang("").is_err());
        assert!(validate_lang("EN").is_err());
        assert!(validate_lang("en:us").is_err());
        assert!(validate_lang("language").is_err());
    }
}
