//! Compact output post-pass.
//!
//! Runs over already-generated text: comments go, blank lines go, and
//! whitespace next to `{ } ( ) ; ,` collapses. String literals pass through
//! untouched, so a `//` or `;` inside one is preserved.

use regex::{Captures, Regex};

lazy_static::lazy_static! {
    static ref COMMENTS: Regex = Regex::new(r#""(?:[^"\\\n]|\\.)*"|//[^\n]*|/\*[\s\S]*?\*/"#).unwrap();
    static ref PUNCTUATION: Regex = Regex::new(r#""(?:[^"\\\n]|\\.)*"|\s*([{}();,])\s*"#).unwrap();
}

pub fn compress(code: &str) -> String {
    let without_comments = COMMENTS.replace_all(code, |caps: &Captures| {
        let matched = &caps[0];
        if matched.starts_with('"') {
            matched.to_string()
        } else {
            String::new()
        }
    });

    let lines: Vec<&str> = without_comments
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let joined = lines.join("\n");

    PUNCTUATION
        .replace_all(&joined, |caps: &Captures| match caps.get(1) {
            Some(punctuation) => punctuation.as_str().to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
