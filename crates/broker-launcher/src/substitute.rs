//! `${NAME}` / `$NAME` placeholder substitution over decrypted secrets.
//!
//! References to names absent from the decrypted secret map are left
//! untouched rather than treated as an error — the stub spec is allowed to
//! mention a name the caller never declared in `secrets`.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{(?P<braced>[A-Za-z_][A-Za-z0-9_]*)\}|\$(?P<bare>[A-Za-z_][A-Za-z0-9_]*)")
            .expect("placeholder pattern is a valid regex")
    })
}

/// Replace every `${NAME}`/`$NAME` placeholder in `input` with the
/// matching entry from `secrets`, leaving unmatched names untouched.
#[must_use]
pub fn substitute(input: &str, secrets: &BTreeMap<String, String>) -> String {
    placeholder_pattern()
        .replace_all(input, |caps: &Captures<'_>| {
            let name = caps
                .name("braced")
                .or_else(|| caps.name("bare"))
                .expect("one of the two named groups always matches")
                .as_str();
            match secrets.get(name) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
