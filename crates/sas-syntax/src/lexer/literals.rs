//! Literal recognition helpers: quoted-literal suffixes, date validation,
//! numerics and formats.

use super::tokens::TokenKind;

const MONTHS: [(&str, u32); 12] = [
    ("JAN", 31),
    ("FEB", 29),
    ("MAR", 31),
    ("APR", 30),
    ("MAY", 31),
    ("JUN", 30),
    ("JUL", 31),
    ("AUG", 31),
    ("SEP", 30),
    ("OCT", 31),
    ("NOV", 30),
    ("DEC", 31),
];

/// Returns the number of days allowed for a three letter month abbreviation.
///
/// February allows 29 days regardless of the year.
#[must_use]
pub fn days_in_month(month: &str) -> Option<u32> {
    MONTHS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(month))
        .map(|&(_, days)| days)
}

/// Returns `true` if `text` is `DDMONYY` or `DDMONYYYY` with a valid day.
#[must_use]
pub fn is_valid_date(text: &str) -> bool {
    let text = text.trim();
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    if !(1..=2).contains(&digits) {
        return false;
    }
    let (day, rest) = text.split_at(digits);
    let Some(month) = rest.get(..3) else {
        return false;
    };
    let year = &rest[3..];
    if !matches!(year.len(), 2 | 4) || !year.chars().all(|ch| ch.is_ascii_digit()) {
        return false;
    }
    let Ok(day) = day.parse::<u32>() else {
        return false;
    };
    days_in_month(month).is_some_and(|max| (1..=max).contains(&day))
}

/// Length in bytes of a leading `DDMONYY[YY]` run in `text`, if any, regardless
/// of the day's validity. The run must not be followed by a name character.
#[must_use]
pub fn date_run_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let day = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if !(1..=2).contains(&day) {
        return None;
    }
    let month = text.get(day..day + 3)?;
    if days_in_month(month).is_none() {
        return None;
    }
    let year = bytes
        .get(day + 3..)?
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    let len = match year {
        2 | 4 => day + 3 + year,
        _ => return None,
    };
    match text[len..].chars().next() {
        Some(ch) if is_name_char(ch) => None,
        _ => Some(len),
    }
}

/// Classifies the suffix following a closing quote.
///
/// Returns the literal kind and the number of suffix bytes to consume.
/// `content` is the text between the quotes, used to validate date literals.
#[must_use]
pub fn classify_suffix(content: &str, after: &str) -> (TokenKind, usize) {
    let mut chars = after.chars().map(|ch| ch.to_ascii_lowercase());
    let first = chars.next();
    let second = chars.next();
    let third = chars.next();

    if first == Some('d') && second == Some('t') && !third.is_some_and(is_name_char) {
        return (TokenKind::DateTime, 2);
    }
    if second.is_some_and(is_name_char) {
        return (TokenKind::String, 0);
    }
    match first {
        Some('d') if is_valid_date(content) => (TokenKind::Date, 1),
        Some('t') => (TokenKind::Time, 1),
        Some('b') => (TokenKind::BitMask, 1),
        Some('n') => (TokenKind::NameLiteral, 1),
        Some('x') => (TokenKind::Hex, 1),
        _ => (TokenKind::String, 0),
    }
}

/// Returns `true` for characters that may start a SAS name.
#[must_use]
pub fn is_name_start(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

/// Returns `true` for characters that may continue a SAS name.
#[must_use]
pub fn is_name_char(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

/// Length of a numeric literal at the start of `text` (which starts with a
/// digit or `.digit`).
#[must_use]
pub fn numeric_len(text: &str) -> usize {
    let bytes = text.as_bytes();

    // Hex numeric: digit, hex digits, `x`, not followed by a name character.
    if bytes.first().is_some_and(u8::is_ascii_digit) {
        let hex = bytes.iter().take_while(|b| b.is_ascii_hexdigit()).count();
        if matches!(bytes.get(hex), Some(b'x' | b'X'))
            && !text[hex + 1..].chars().next().is_some_and(is_name_char)
        {
            return hex + 1;
        }
    }

    let mut len = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if bytes.get(len) == Some(&b'.') {
        len += 1;
        len += bytes[len..].iter().take_while(|b| b.is_ascii_digit()).count();
    }
    if matches!(bytes.get(len), Some(b'e' | b'E')) {
        let mut exp = len + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let digits = bytes[exp.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits > 0 {
            len = exp + digits;
        }
    }
    len
}

/// If `rest` (the text following a word) turns the word into a format,
/// returns the number of bytes to consume: the dot plus optional decimals.
#[must_use]
pub fn format_tail_len(rest: &str) -> Option<usize> {
    let tail = rest.strip_prefix('.')?;
    let decimals = tail.bytes().take_while(u8::is_ascii_digit).count();
    match tail[decimals..].chars().next() {
        Some(ch) if is_name_char(ch) => None,
        _ => Some(1 + decimals),
    }
}
