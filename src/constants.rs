/// Sentinel language tag stored for every slug of a non-multilang part
pub const LANG_ALL: &str = "all";

/// Maximum part name length (characters)
pub const MAX_PART_NAME_LEN: usize = 200;

/// Maximum model tag length (characters)
pub const MAX_MODEL_NAME_LEN: usize = 200;

/// Maximum slug name length (characters)
pub const MAX_SLUG_NAME_LEN: usize = 200;

/// Maximum language tag length (ISO 639-1 + specials such as "all")
pub const MAX_LANG_LEN: usize = 7;
