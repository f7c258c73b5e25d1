//! Channel names and patterns.
//!
//! Channels are dot-delimited, case-insensitive paths such as
//! `node.peer.UGVlcjox`. Patterns use shell-style globbing where `.` is the
//! separator: `*` matches any run of characters within one segment, `?`
//! matches a single character, `[...]` matches a character class (`^`
//! negates, `a-z` ranges) and `\` escapes the next character.

pub const SEPARATOR: char = '.';

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("syntax error in pattern")]
pub struct PatternError;

/// Joins `chunks` into a normalized channel name.
///
/// Every chunk is split on `/`, empty and `.` segments are dropped, `..`
/// removes the previous segment, and the result is lower-cased and joined
/// with `.`.
pub fn join_path(chunks: &[&str]) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in chunks.iter().flat_map(|chunk| chunk.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    segments.join(".").to_lowercase()
}

/// Reports whether `name` matches the glob `pattern`.
///
/// Malformed patterns are reported as an error, even when the malformed part
/// is never reached while matching.
pub fn matches(pattern: &str, name: &str) -> Result<bool, PatternError> {
    let mut pattern = pattern;
    let mut name = name;

    'pattern: while !pattern.is_empty() {
        let (star, chunk, rest) = scan_chunk(pattern);
        pattern = rest;

        if star && chunk.is_empty() {
            // trailing `*` swallows the rest of the segment
            return Ok(!name.contains(SEPARATOR));
        }

        let (tail, ok) = match_chunk(chunk, name)?;
        if ok && (tail.is_empty() || !pattern.is_empty()) {
            name = tail;
            continue;
        }

        if star {
            for (i, c) in name.char_indices() {
                if c == SEPARATOR {
                    break;
                }
                let (tail, ok) = match_chunk(chunk, &name[i + c.len_utf8()..])?;
                if ok {
                    if pattern.is_empty() && !tail.is_empty() {
                        continue;
                    }
                    name = tail;
                    continue 'pattern;
                }
            }
        }

        validate(pattern)?;
        return Ok(false);
    }

    Ok(name.is_empty())
}

/// Checks the syntax of `pattern` without matching anything.
pub fn validate(pattern: &str) -> Result<(), PatternError> {
    let mut pattern = pattern;
    while !pattern.is_empty() {
        let (_, chunk, rest) = scan_chunk(pattern);
        pattern = rest;
        match_chunk(chunk, "")?;
    }
    Ok(())
}

/// Splits off the leading stars and the following chunk of non-star pattern.
fn scan_chunk(pattern: &str) -> (bool, &str, &str) {
    let trimmed = pattern.trim_start_matches('*');
    let star = trimmed.len() != pattern.len();

    let mut in_range = false;
    let mut escaped = false;
    let mut end = trimmed.len();
    for (i, c) in trimmed.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' => in_range = true,
            ']' => in_range = false,
            '*' if !in_range => {
                end = i;
                break;
            }
            _ => {}
        }
    }

    (star, &trimmed[..end], &trimmed[end..])
}

fn split_first(s: &str) -> Option<(char, &str)> {
    let c = s.chars().next()?;
    Some((c, &s[c.len_utf8()..]))
}

/// Matches `chunk` against the start of `s`, returning the unmatched rest.
/// The whole chunk is parsed even after a mismatch so syntax errors surface.
fn match_chunk<'a>(chunk: &str, s: &'a str) -> Result<(&'a str, bool), PatternError> {
    let mut chunk = chunk;
    let mut s = s;
    let mut failed = false;

    while let Some((c, rest)) = split_first(chunk) {
        if s.is_empty() {
            failed = true;
        }

        match c {
            '[' => {
                let mut current = None;
                if !failed {
                    if let Some((r, tail)) = split_first(s) {
                        current = Some(r);
                        s = tail;
                    }
                }
                chunk = rest;

                let negated = chunk.starts_with('^');
                if negated {
                    chunk = &chunk[1..];
                }

                let mut matched = false;
                let mut ranges = 0;
                loop {
                    if ranges > 0 {
                        if let Some(rest) = chunk.strip_prefix(']') {
                            chunk = rest;
                            break;
                        }
                    }
                    let (lo, rest) = get_esc(chunk)?;
                    chunk = rest;
                    let mut hi = lo;
                    if let Some(rest) = chunk.strip_prefix('-') {
                        let (end, rest) = get_esc(rest)?;
                        hi = end;
                        chunk = rest;
                    }
                    if current.is_some_and(|r| lo <= r && r <= hi) {
                        matched = true;
                    }
                    ranges += 1;
                }

                if matched == negated {
                    failed = true;
                }
            }
            '?' => {
                if !failed {
                    if let Some((r, tail)) = split_first(s) {
                        if r == SEPARATOR {
                            failed = true;
                        }
                        s = tail;
                    }
                }
                chunk = rest;
            }
            '\\' => {
                let (escaped, rest) = split_first(rest).ok_or(PatternError)?;
                failed = failed || !eat(&mut s, escaped);
                chunk = rest;
            }
            c => {
                failed = failed || !eat(&mut s, c);
                chunk = rest;
            }
        }
    }

    if failed {
        Ok(("", false))
    } else {
        Ok((s, true))
    }
}

/// Consumes one character of `s`, reporting whether it was `expected`.
fn eat(s: &mut &str, expected: char) -> bool {
    match split_first(s) {
        Some((c, tail)) => {
            *s = tail;
            c == expected
        }
        None => false,
    }
}

/// Reads one possibly escaped character of a character class.
fn get_esc(chunk: &str) -> Result<(char, &str), PatternError> {
    if chunk.is_empty() || chunk.starts_with('-') || chunk.starts_with(']') {
        return Err(PatternError);
    }
    let chunk = chunk.strip_prefix('\\').unwrap_or(chunk);
    let (c, rest) = split_first(chunk).ok_or(PatternError)?;
    if rest.is_empty() {
        return Err(PatternError);
    }
    Ok((c, rest))
}
