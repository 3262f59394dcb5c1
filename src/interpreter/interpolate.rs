//! Variable Interpolation
//!
//! Expands `${name}` placeholders in command argument strings against the
//! currently bound variables. Expansion happens at command-execution time,
//! so a placeholder always sees the latest value.

use lazy_static::lazy_static;
use regex_lite::Regex;

use crate::interpreter::types::Environment;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
}

/// Expand `${name}` placeholders in `input` from `env`.
///
/// Returns the name of the first unbound placeholder on failure. Text that
/// does not match the placeholder shape (`${0}`, `$name`, a lone `${`) is
/// left untouched.
pub fn interpolate(input: &str, env: &Environment) -> Result<String, String> {
    if !input.contains("${") {
        return Ok(input.to_string());
    }

    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(input) {
        let (whole, name) = match (caps.get(0), caps.get(1)) {
            (Some(w), Some(n)) => (w, n),
            _ => continue,
        };
        let value = match env.get(name.as_str()) {
            Some(v) => v,
            None => return Err(name.as_str().to_string()),
        };
        out.push_str(&input[last..whole.start()]);
        out.push_str(&value.to_string());
        last = whole.end();
    }
    out.push_str(&input[last..]);
    Ok(out)
}
