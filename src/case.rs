use serde::{Deserialize, Deserializer, Serialize};

/// Case-converting rule applied to slug names for a part.
///
/// Stored as part of the part definition. Values written by a newer version
/// that this build does not know deserialize as `None`, which leaves names
/// untouched.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaseRule {
    #[default]
    None,
    Lower,
    Upper,
    Letter,
    Capitalize,
}

impl<'de> Deserialize<'de> for CaseRule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "none" => CaseRule::None,
            "lower" => CaseRule::Lower,
            "upper" => CaseRule::Upper,
            "letter" => CaseRule::Letter,
            "capitalize" => CaseRule::Capitalize,
            unknown => {
                tracing::warn!(rule = unknown, "Unknown case rule, treating as none");
                CaseRule::None
            }
        })
    }
}

/// Apply a part's case rule to a candidate slug name.
///
/// Pure transform, Unicode-aware: multi-char case expansions (e.g. 'ß' to
/// "SS") are kept. `Letter` uppercases the first char and lowercases the
/// rest; `Capitalize` title-cases, starting a new word after any
/// non-alphanumeric char ("my-post" becomes "My-Post").
pub fn normalize(rule: CaseRule, text: &str) -> String {
    match rule {
        CaseRule::None => text.to_string(),
        CaseRule::Lower => text.to_lowercase(),
        CaseRule::Upper => text.to_uppercase(),
        CaseRule::Letter => {
            let mut chars = text.chars();
            match chars.next() {
                Some(first) => {
                    let mut out = String::with_capacity(text.len());
                    out.extend(first.to_uppercase());
                    out.push_str(&chars.as_str().to_lowercase());
                    out
                }
                None => String::new(),
            }
        }
        CaseRule::Capitalize => {
            let mut out = String::with_capacity(text.len());
            let mut at_word_start = true;
            for c in text.chars() {
                if c.is_alphanumeric() {
                    if at_word_start {
                        out.extend(c.to_uppercase());
                    } else {
                        out.extend(c.to_lowercase());
                    }
                    at_word_start = false;
                } else {
                    out.push(c);
                    at_word_start = true;
                }
            }
            out
        }
    }
}
