//! Redis-style glob matching for key patterns.
//!
//! Supported syntax: `*` (any run), `?` (any single char), `[abc]`,
//! `[a-z]`, `[^a]` and `\` escapes.

use crate::error::{CacheError, Result};

/// Maximum accepted pattern length in bytes.
pub const MAX_PATTERN_LENGTH: usize = 256;

/// Returns true if `text` matches the glob `pattern`.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0usize, 0usize);
    // Position after the last `*` seen and the text index it is anchored at.
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() {
            match p[pi] {
                '*' => {
                    backtrack = Some((pi + 1, ti));
                    pi += 1;
                    continue;
                }
                '?' => {
                    pi += 1;
                    ti += 1;
                    continue;
                }
                '[' => match match_class(&p, pi, t[ti]) {
                    Some((true, next)) => {
                        pi = next;
                        ti += 1;
                        continue;
                    }
                    Some((false, _)) => {}
                    None => {
                        if t[ti] == '[' {
                            pi += 1;
                            ti += 1;
                            continue;
                        }
                    }
                },
                '\\' if pi + 1 < p.len() => {
                    if p[pi + 1] == t[ti] {
                        pi += 2;
                        ti += 1;
                        continue;
                    }
                }
                c => {
                    if c == t[ti] {
                        pi += 1;
                        ti += 1;
                        continue;
                    }
                }
            }
        }

        match backtrack {
            Some((star_pi, star_ti)) => {
                pi = star_pi;
                ti = star_ti + 1;
                backtrack = Some((star_pi, star_ti + 1));
            }
            None => return false,
        }
    }

    p[pi..].iter().all(|c| *c == '*')
}

/// Matches `c` against the class starting at `p[start] == '['`.
///
/// Returns whether it matched and the index just past the closing `]`,
/// or `None` for an unterminated class.
fn match_class(p: &[char], start: usize, c: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negate = p.get(i) == Some(&'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    loop {
        let ch = *p.get(i)?;
        match ch {
            ']' => break,
            '\\' => {
                if *p.get(i + 1)? == c {
                    matched = true;
                }
                i += 2;
            }
            _ if p.get(i + 1) == Some(&'-') && p.get(i + 2).is_some_and(|end| *end != ']') => {
                let end = p[i + 2];
                let (lo, hi) = if ch <= end { (ch, end) } else { (end, ch) };
                if (lo..=hi).contains(&c) {
                    matched = true;
                }
                i += 3;
            }
            _ => {
                if ch == c {
                    matched = true;
                }
                i += 1;
            }
        }
    }

    Some((matched != negate, i + 1))
}

/// Rejects patterns the admin introspection endpoints should not run.
pub fn validate_pattern(pattern: &str) -> Result<()> {
    if pattern.is_empty() {
        return Err(CacheError::InvalidPattern(
            "Pattern cannot be empty".to_string(),
        ));
    }
    if pattern.len() > MAX_PATTERN_LENGTH {
        return Err(CacheError::InvalidPattern(format!(
            "Pattern exceeds maximum length of {} bytes",
            MAX_PATTERN_LENGTH
        )));
    }

    let mut chars = pattern.chars();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            _ => {}
        }
    }
    if in_class {
        return Err(CacheError::InvalidPattern(format!(
            "Unterminated character class in '{}'",
            pattern
        )));
    }

    Ok(())
}
