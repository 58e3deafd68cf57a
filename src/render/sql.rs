use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static CLAUSE_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(left\s+join|right\s+join|inner\s+join|group\s+by|order\s+by|select|from|where|join|having|limit)\b",
    )
    .expect("clause keyword pattern")
});

static CONDITION_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(and|or)\b").expect("condition keyword pattern"));

fn keyword(caps: &Captures) -> String {
    caps[1]
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Put each major clause on its own line and indent boolean connectives.
///
/// Purely cosmetic: keywords are upper-cased and line breaks inserted, the
/// output is not guaranteed to be equivalent SQL when keywords appear inside
/// string literals.
pub fn format_sql(sql: &str) -> String {
    let broken = CLAUSE_KEYWORDS.replace_all(sql, |caps: &Captures| format!("\n{}", keyword(caps)));
    let broken =
        CONDITION_KEYWORDS.replace_all(&broken, |caps: &Captures| format!("\n  {}", keyword(caps)));

    broken
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
