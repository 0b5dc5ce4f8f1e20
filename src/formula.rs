//! Region configuration parser.
//!
//! The configuration is line oriented:
//!
//! ```text
//! # comment
//! !excluded_top_level_key
//! RegionName = base + plus_a + plus_b ~ minus_a
//! ```
//!
//! `+` and `~` switch the element mode for every token that follows until
//! the other operator appears.

use crate::data::{Region, RegionConfig};
use crate::error::ConfigParseError;
use log::{debug, trace};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Base,
    Plus,
    Minus,
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

/// Parses region configuration text.
///
/// Fails on the first malformed line; a configuration containing only
/// comments and blank lines parses to an empty [`RegionConfig`].
pub fn parse_region_config(text: &str) -> Result<RegionConfig, ConfigParseError> {
    let mut config = RegionConfig::default();
    let mut seen_names: HashSet<String> = HashSet::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(key) = line.strip_prefix('!') {
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigParseError::EmptyExclusion { line: line_no });
            }
            trace!("line {}: excluding top-level key {}", line_no, key);
            config.top_level_excluded_keys.push(key.to_string());
            continue;
        }

        let region = parse_region_line(line_no, line)?;
        if !seen_names.insert(region.name.clone()) {
            return Err(ConfigParseError::DuplicateRegion {
                line: line_no,
                name: region.name,
            });
        }
        config.regions.push(region);
    }

    debug!(
        "Parsed {} regions and {} top-level exclusions.",
        config.regions.len(),
        config.top_level_excluded_keys.len()
    );
    Ok(config)
}

fn parse_region_line(line_no: usize, line: &str) -> Result<Region, ConfigParseError> {
    let (name, formula) = match line.split_once('=') {
        Some((name, formula)) if !formula.contains('=') => (name.trim(), formula),
        _ => {
            return Err(ConfigParseError::MissingSeparator {
                line: line_no,
                text: line.to_string(),
            });
        }
    };
    if !is_token(name) {
        return Err(ConfigParseError::InvalidRegionName {
            line: line_no,
            text: line.to_string(),
        });
    }

    let mut region = Region::new(name);
    let mut mode = Mode::Base;
    let mut token = String::new();
    let mut element_count = 0;

    // trailing space flushes the final token
    for c in formula.chars().chain(std::iter::once(' ')) {
        if is_token_char(c) {
            token.push(c);
            continue;
        }
        if !token.is_empty() {
            let element = std::mem::take(&mut token);
            match mode {
                Mode::Base => region.base_elements.insert(element),
                Mode::Plus => region.plus_elements.insert(element),
                Mode::Minus => region.minus_elements.insert(element),
            };
            element_count += 1;
        }
        match c {
            '+' => mode = Mode::Plus,
            '~' => mode = Mode::Minus,
            c if c.is_whitespace() => {}
            other => {
                return Err(ConfigParseError::InvalidCharacter {
                    line: line_no,
                    found: other,
                    text: line.to_string(),
                });
            }
        }
    }

    if element_count == 0 {
        return Err(ConfigParseError::EmptyFormula {
            line: line_no,
            text: line.to_string(),
        });
    }
    Ok(region)
}
