pub fn part_key(part_id: &str) -> String {
    part_id.to_string()
}

pub fn part_name_index_key(name: &str) -> String {
    format!("name:{}", name)
}

pub fn slug_key(slug_id: &str) -> String {
    slug_id.to_string()
}

/// Uniqueness key for a slug within its (part, language) namespace.
/// `part_id` is a UUID and `lang` passes `validate_lang`, so the first two
/// segments never contain ':'; the name is the final segment and may.
pub fn slug_name_index_key(part_id: &str, lang: &str, name: &str) -> String {
    format!("{}:{}:{}", part_id, lang, name)
}

/// In-tree index key in the slugs tree, listing a target object's slugs.
/// UUID record keys never start with "obj:", so the prefixes cannot collide.
pub fn slug_object_index_key(part_id: &str, object_id: i64, slug_id: &str) -> String {
    format!("obj:{}:{}:{}", part_id, object_id, slug_id)
}

pub fn slug_object_prefix(part_id: &str, object_id: i64) -> String {
    format!("obj:{}:{}:", part_id, object_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_index_key_keeps_name_verbatim() {
        assert_eq!(slug_name_index_key("p1", "en", "My:Post"), "p1:en:My:Post");
    }

    #[test]
    fn object_prefix_covers_object_keys() {
        let key = slug_object_index_key("p1", 42, "s1");
        assert!(key.starts_with(&slug_object_prefix("p1", 42)));
    }

    #[test]
    fn object_prefix_does_not_match_longer_ids() {
        let key = slug_object_index_key("p1", 421, "s1");
        assert!(!key.starts_with(&slug_object_prefix("p1", 42)));
    }
}
