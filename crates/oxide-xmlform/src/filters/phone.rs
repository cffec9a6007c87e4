//! Telephone number normalization to `<country code>.<number>`.

use std::sync::LazyLock;

use regex::Regex;

static NANP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+?1[-. ]?)?\(?([2-9][0-8][0-9])\)?[-. ]?([0-9]{3})[-. ]?([0-9]{4})$")
        .expect("valid regex")
});
static ITU_T: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+(?:[0-9] ?){6,14}[0-9]$").expect("valid regex"));
static EPP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[0-9]{1,3}\.[0-9]{4,14}(?:x.+)?$").expect("valid regex"));
static CANONICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{1,3}\.[0-9]{4,14}$").expect("valid regex"));

/// Longest digit string that is still accepted as a number.
const MAX_DIGITS: usize = 15;
/// Digit strings up to this length are taken as local numbers.
const LOCAL_DIGITS: usize = 12;

/// Normalizes a phone number.
///
/// Patterns are tried in order: North American numbering plan, ITU-T
/// (`+cc nnnn`), EPP (`+cc.nnnn[xEXT]`, extension dropped), an already
/// canonical `cc.nnnn`, and finally the bare digits. Bare digit strings of
/// up to twelve digits become local numbers with an empty country code;
/// longer ones get the excess leading digits as country code. Anything that
/// leaves no digits or more than fifteen yields an empty string.
pub fn normalize(raw: &str) -> String {
    let value = raw.trim();

    if NANP.is_match(value) {
        let digits = digits_of(value);
        let number = digits.strip_prefix('1').unwrap_or(&digits);
        return format!("1.{number}");
    }

    if ITU_T.is_match(value) {
        let (country, number) = value.split_once(' ').unwrap_or(("", value));
        return format!("{}.{}", digits_of(country), digits_of(number));
    }

    if EPP.is_match(value) {
        let without_extension = value.split_once('x').map_or(value, |(number, _)| number);
        return without_extension.replace('+', "");
    }

    if CANONICAL.is_match(value) {
        return value.to_string();
    }

    let digits = digits_of(value);
    if digits.is_empty() || digits.len() > MAX_DIGITS {
        return String::new();
    }
    if digits.len() <= LOCAL_DIGITS {
        return format!(".{digits}");
    }
    let (country, number) = digits.split_at(digits.len() - LOCAL_DIGITS);
    format!("{country}.{number}")
}

/// Returns whether `value` is a phone number in the given numbering plan.
///
/// Plans are `northamerica` (also `us`, `nanp`), `international` (also
/// `int`, `itu-t`, `missdn`) and `epp` (also `ietf`). Without a plan, or
/// with an unknown one, any string of 7 to 15 digits is accepted once
/// separators are removed.
pub fn matches_plan(value: &str, plan: Option<&str>) -> bool {
    let value = value.trim();
    match plan.map(str::to_ascii_lowercase).as_deref() {
        Some("northamerica" | "us" | "nanp") => NANP.is_match(value),
        Some("international" | "int" | "itu-t" | "missdn") => ITU_T.is_match(value),
        Some("epp" | "ietf") => EPP.is_match(value),
        _ => {
            let stripped: String = value
                .chars()
                .filter(|ch| !matches!(ch, '+' | '.' | ' ' | '-' | '(' | ')'))
                .collect();
            (7..=MAX_DIGITS).contains(&stripped.len())
                && stripped.chars().all(|ch| ch.is_ascii_digit())
        }
    }
}

fn digits_of(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}
