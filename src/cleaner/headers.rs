//! Column header normalization

use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]").expect("Invalid non-word regex"));

/// Normalize a header: trim, lowercase, spaces to underscores, then drop
/// every non-word character.
pub fn clean_header(name: &str) -> String {
    let lowered = name.trim().to_lowercase().replace(' ', "_");
    NON_WORD.replace_all(&lowered, "").into_owned()
}
