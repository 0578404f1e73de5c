//! Compiled OSC address patterns

use regex_lite::Regex;

use crate::{Error, Result};

/// A compiled matcher for one OSC address pattern
#[derive(Debug, Clone)]
pub struct Matcher {
    source: String,
    regex: Regex,
}

impl Matcher {
    /// Compile an OSC pattern.
    ///
    /// The pattern syntax is translated to a regex first. If the result does not
    /// compile (an empty or reversed character range, say), the address is
    /// compiled again as an escaped literal. When that fails too, the error from
    /// the first attempt is returned.
    pub fn compile(pattern: &str) -> Result<Self> {
        let regex = match Regex::new(&translate(pattern)) {
            Ok(regex) => regex,
            Err(original) => match Regex::new(&format!("^{}$", regex_lite::escape(pattern))) {
                Ok(regex) => regex,
                Err(_) => {
                    return Err(Error::InvalidPattern {
                        pattern: pattern.to_string(),
                        source: original,
                    })
                }
            },
        };

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Check if a literal address matches this pattern
    pub fn is_match(&self, address: &str) -> bool {
        self.regex.is_match(address)
    }

    /// The pattern this matcher was compiled from
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Translate OSC pattern syntax into an anchored regex
fn translate(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    let mut chars = pattern.chars().peekable();
    let mut in_set = false;
    let mut in_alternation = false;

    out.push('^');
    while let Some(c) = chars.next() {
        match c {
            '*' if !in_set => out.push_str("[^/]*"),
            '?' if !in_set => out.push_str("[^/]"),
            '[' => {
                in_set = true;
                out.push('[');
                if chars.peek() == Some(&'!') {
                    chars.next();
                    out.push('^');
                }
            }
            ']' => {
                in_set = false;
                out.push(']');
            }
            '-' if in_set => out.push('-'),
            '{' => {
                in_alternation = true;
                out.push_str("(?:");
            }
            '}' => {
                in_alternation = false;
                out.push(')');
            }
            ',' if in_alternation => out.push('|'),
            c if is_regex_meta(c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('$');
    out
}

fn is_regex_meta(c: char) -> bool {
    matches!(
        c,
        '.' | '^' | '$' | '*' | '+' | '?' | '{' | '}' | '[' | ']' | '\\' | '|' | '(' | ')'
    )
}
