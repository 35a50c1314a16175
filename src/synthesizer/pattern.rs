//! Best-effort generation of a string matching a regular expression.
//! Handles the subset of syntax that appears in model constraints
//! (literals, classes, groups, alternation, the usual quantifiers); the
//! caller verifies the candidate against the compiled pattern and falls
//! back to a placeholder with a warning when generation misses.

/// Attempt to build a matching string. `None` means the pattern uses
/// syntax the generator does not understand.
pub fn generate(pattern: &str) -> Option<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut pos = 0;
    let out = alternatives(&chars, &mut pos, true)?;
    if pos == chars.len() { Some(out) } else { None }
}

/// One alternation: generate the first alternative, skip the rest.
fn alternatives(chars: &[char], pos: &mut usize, top: bool) -> Option<String> {
    let out = sequence(chars, pos, top)?;
    while *pos < chars.len() && chars[*pos] == '|' {
        *pos += 1;
        skip_sequence(chars, pos, top)?;
    }
    Some(out)
}

fn sequence(chars: &[char], pos: &mut usize, top: bool) -> Option<String> {
    let mut out = String::new();
    while *pos < chars.len() {
        match chars[*pos] {
            '|' => break,
            ')' if !top => break,
            ')' => return None,
            _ => {
                let atom = atom(chars, pos)?;
                let (min, _) = quantifier(chars, pos)?;
                for _ in 0..min {
                    out.push_str(&atom);
                }
            }
        }
    }
    Some(out)
}

/// Consume an alternative without keeping its output.
fn skip_sequence(chars: &[char], pos: &mut usize, top: bool) -> Option<()> {
    sequence(chars, pos, top).map(|_| ())
}

fn atom(chars: &[char], pos: &mut usize) -> Option<String> {
    match chars[*pos] {
        '^' | '$' => {
            *pos += 1;
            Some(String::new())
        }
        '(' => {
            *pos += 1;
            // Non-capturing prefix.
            if chars.get(*pos) == Some(&'?') && chars.get(*pos + 1) == Some(&':') {
                *pos += 2;
            } else if chars.get(*pos) == Some(&'?') {
                return None;
            }
            let inner = alternatives(chars, pos, false)?;
            if chars.get(*pos) != Some(&')') {
                return None;
            }
            *pos += 1;
            Some(inner)
        }
        '[' => {
            *pos += 1;
            class_char(chars, pos).map(|c| c.to_string())
        }
        '\\' => {
            *pos += 1;
            let escaped = *chars.get(*pos)?;
            *pos += 1;
            Some(escape_char(escaped)?.to_string())
        }
        '.' => {
            *pos += 1;
            Some("a".to_string())
        }
        '*' | '+' | '?' | '{' => None,
        literal => {
            *pos += 1;
            Some(literal.to_string())
        }
    }
}

/// Pick the first concrete character of a class and skip to its `]`.
fn class_char(chars: &[char], pos: &mut usize) -> Option<char> {
    if chars.get(*pos) == Some(&'^') {
        // Negated classes are rare in model patterns; not worth guessing.
        return None;
    }
    let mut picked = None;
    while *pos < chars.len() && chars[*pos] != ']' {
        let c = match chars[*pos] {
            '\\' => {
                *pos += 1;
                let escaped = *chars.get(*pos)?;
                *pos += 1;
                escape_char(escaped)?
            }
            other => {
                *pos += 1;
                other
            }
        };
        // Range tail, e.g. the "-z" of "a-z": the range start already won.
        if chars.get(*pos) == Some(&'-') && chars.get(*pos + 1) != Some(&']') {
            *pos += 2;
        }
        picked.get_or_insert(c);
    }
    if chars.get(*pos) != Some(&']') {
        return None;
    }
    *pos += 1;
    picked
}

fn escape_char(escaped: char) -> Option<char> {
    match escaped {
        'd' => Some('7'),
        'w' => Some('a'),
        's' => Some(' '),
        'n' => Some('\n'),
        't' => Some('\t'),
        'D' | 'W' | 'S' | 'b' | 'B' => None,
        other => Some(other),
    }
}

/// Minimum (and declared maximum, if bounded) repetition of the atom.
fn quantifier(chars: &[char], pos: &mut usize) -> Option<(usize, Option<usize>)> {
    match chars.get(*pos) {
        Some('?') => {
            *pos += 1;
            Some((0, Some(1)))
        }
        Some('*') => {
            *pos += 1;
            Some((0, None))
        }
        Some('+') => {
            *pos += 1;
            Some((1, None))
        }
        Some('{') => {
            *pos += 1;
            let mut min = String::new();
            while chars.get(*pos).is_some_and(|c| c.is_ascii_digit()) {
                min.push(chars[*pos]);
                *pos += 1;
            }
            let min: usize = min.parse().ok()?;
            let max = match chars.get(*pos) {
                Some(',') => {
                    *pos += 1;
                    let mut max = String::new();
                    while chars.get(*pos).is_some_and(|c| c.is_ascii_digit()) {
                        max.push(chars[*pos]);
                        *pos += 1;
                    }
                    if max.is_empty() { None } else { Some(max.parse().ok()?) }
                }
                _ => Some(min),
            };
            if chars.get(*pos) != Some(&'}') {
                return None;
            }
            *pos += 1;
            Some((min, max))
        }
        _ => Some((1, Some(1))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn assert_generates(pattern: &str) {
        let candidate = generate(pattern).unwrap_or_else(|| panic!("no candidate for {pattern}"));
        let anchored = Regex::new(&format!("^(?:{pattern})$")).unwrap();
        assert!(
            anchored.is_match(&candidate),
            "'{candidate}' does not match {pattern}"
        );
    }

    #[test]
    fn generates_for_common_model_patterns() {
        assert_generates("[A-Z][a-z]+");
        assert_generates("\\d{3}-\\d{2}");
        assert_generates("(yes|no)");
        assert_generates("ICD-(?:10|11)-[A-Z]\\d*");
        assert_generates("^v\\d+(\\.\\d+)?$");
    }

    #[test]
    fn gives_up_on_negated_classes() {
        assert_eq!(generate("[^abc]+"), None);
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert_eq!(generate("a)"), None);
    }
}
