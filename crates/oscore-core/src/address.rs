//! OSC address classification
//!
//! OSC addresses are slash-separated paths:
//! ```text
//! /synth/1/freq
//! /mixer/channel/3/gain
//! ```
//!
//! Patterns add wildcard syntax on top of that:
//! - `?` matches any single character
//! - `*` matches any run of characters within a segment
//! - `[a-z]`, `[!0-9]` match one character from (or outside) a set
//! - `{left,right}` matches either literal

/// Result of classifying an address string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    /// Literal address with no pattern syntax
    Address,
    /// Address containing pattern metacharacters
    Pattern,
    /// Not a usable address
    Invalid,
}

/// Classify an address in a single pass over its characters
pub fn classify(address: &str) -> AddressType {
    if !address.starts_with('/') {
        return AddressType::Invalid;
    }

    let mut bracket_depth = 0i32;
    let mut brace_depth = 0i32;
    let mut pattern = false;

    for c in address.chars() {
        match c {
            '[' => {
                bracket_depth += 1;
                pattern = true;
            }
            ']' => {
                bracket_depth -= 1;
                pattern = true;
            }
            '{' => {
                brace_depth += 1;
                pattern = true;
            }
            '}' => {
                brace_depth -= 1;
                pattern = true;
            }
            '*' | '?' => pattern = true,
            '#' => return AddressType::Invalid,
            ',' if brace_depth == 0 => return AddressType::Invalid,
            c if c.is_whitespace() || c.is_control() => return AddressType::Invalid,
            _ => {}
        }

        if bracket_depth < 0 || brace_depth < 0 || bracket_depth > 1 || brace_depth > 1 {
            return AddressType::Invalid;
        }
    }

    if bracket_depth != 0 || brace_depth != 0 {
        AddressType::Invalid
    } else if pattern {
        AddressType::Pattern
    } else {
        AddressType::Address
    }
}

/// Structural validity check, shared by literal addresses and patterns
pub fn is_valid(address: &str) -> bool {
    classify(address) != AddressType::Invalid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_addresses() {
        assert_eq!(classify("/"), AddressType::Address);
        assert_eq!(classify("/synth/1/freq"), AddressType::Address);
        assert_eq!(classify("/a.b/c-d_e"), AddressType::Address);
    }

    #[test]
    fn test_patterns() {
        for p in [
            "/synth/*/freq",
            "/synth/?/freq",
            "/synth/[0-9]/freq",
            "/synth/[!a-c]",
            "/{left,right}/gain",
        ] {
            assert_eq!(classify(p), AddressType::Pattern, "{}", p);
        }
    }

    #[test]
    fn test_invalid() {
        for a in [
            "",
            "synth/freq",
            "/with space",
            "/tab\there",
            "/hash#",
            "/comma,",
            "/open[",
            "/close]",
            "/brace{a,b",
            "/nested[[a]]",
        ] {
            assert_eq!(classify(a), AddressType::Invalid, "{:?}", a);
            assert!(!is_valid(a));
        }
    }

    #[test]
    fn test_comma_inside_braces_is_pattern() {
        assert_eq!(classify("/{a,b}"), AddressType::Pattern);
    }
}
