//! Dialect files.
//!
//! A dialect file is a TOML table whose keys are the [`Dialect`] fields;
//! missing keys keep their defaults:
//!
//! ```toml
//! delimiter = ";"
//! quote_mode = "non_numeric_only"
//! null_string = "NULL"
//! has_header_record = true
//! ```

use anyhow::Context;
use csv_codec::Dialect;
use std::path::Path;

/// Load a dialect from a TOML file.
pub fn load_dialect(path: &Path) -> anyhow::Result<Dialect> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dialect file {path:?}"))?;
    parse_dialect(&content).with_context(|| format!("Invalid dialect file {path:?}"))
}

pub fn parse_dialect(content: &str) -> anyhow::Result<Dialect> {
    let dialect: Dialect = toml::from_str(content)?;
    Ok(dialect)
}

/// Expand `\n`, `\r`, `\t` and `\\` in separators given on the command line.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
