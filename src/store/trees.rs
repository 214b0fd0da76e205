pub const PARTS: &str = "parts";
pub const SLUGS: &str = "slugs";

// Secondary index tree
pub const SLUG_NAMES: &str = "slug_names";

pub const META: &str = "meta";
