//! Small deterministic text helpers shared by the planner and executor.

/// Title-case a string: the first letter of every run of letters is
/// uppercased and the rest lowercased. Non-letters pass through and start a
/// new word, so `"new york"` becomes `"New York"` and `"o'brien"` becomes
/// `"O'Brien"`.
#[must_use]
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// The whitespace token following the given keyword token, if any.
/// Matching is done on the already-lowercased input.
#[must_use]
pub fn token_after<'a>(lowered: &'a str, keyword: &str) -> Option<&'a str> {
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    let idx = tokens.iter().position(|t| *t == keyword)?;
    tokens.get(idx + 1).copied()
}
