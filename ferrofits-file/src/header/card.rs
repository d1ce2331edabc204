//! Formatting and parsing of 80-character header cards.

use ferrofits_dtype::{AnyValue, Complex64};
use ferrofits_error::{FitsResult, fits_bail, fits_err};

use crate::header::Record;

/// The width of a card.
pub const CARD_WIDTH: usize = 80;

const SHORT_KEYWORD_WIDTH: usize = 8;
const MAX_HIERARCH_KEYWORD_WIDTH: usize = 67;
const FIXED_VALUE_END: usize = 30;
const CONTINUE_PREFIX: &str = "CONTINUE  ";
const MIN_STRING_WIDTH: usize = 8;

/// The keyword of continuation cards.
pub(crate) const CONTINUE: &str = "CONTINUE";

/// The keyword of the long string convention warning.
pub(crate) const LONGSTRN: &str = "LONGSTRN";

/// Returns `true` if the keyword fits the standard 8-character format.
pub(crate) fn is_short_keyword(keyword: &str) -> bool {
    !keyword.is_empty()
        && keyword.len() <= SHORT_KEYWORD_WIDTH
        && keyword
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}

/// The length of a string value once its quotes are doubled.
pub(crate) fn escaped_len(value: &str) -> usize {
    value.len() + value.matches('\'').count()
}

/// The width of the `KEYWORD = ` or `HIERARCH keyword = ` prefix of a valued card.
pub(crate) fn value_prefix_len(keyword: &str) -> usize {
    if is_short_keyword(keyword) {
        SHORT_KEYWORD_WIDTH + 2
    } else {
        "HIERARCH ".len() + keyword.len() + 3
    }
}

/// Returns `true` if a quoted string value does not fit on the card after the prefix.
pub(crate) fn needs_continuation(prefix_len: usize, value: &str) -> bool {
    prefix_len + escaped_len(value).max(MIN_STRING_WIDTH) + 2 > CARD_WIDTH
}

/// A parsed value token.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CardValue {
    Str(String),
    Logical(bool),
    Integer(i128),
    Real(f64),
    Complex(f64, f64),
    Undefined,
}

impl CardValue {
    /// Converts to the narrowest natural value type: integers become `i64` (or `u64` when
    /// too large), reals `f64` and complex numbers `Complex64`.
    pub(crate) fn into_any(self, keyword: &str) -> FitsResult<AnyValue> {
        Ok(match self {
            CardValue::Str(value) => AnyValue::Str(value),
            CardValue::Logical(value) => AnyValue::Bool(value),
            CardValue::Integer(value) => match i64::try_from(value) {
                Ok(value) => AnyValue::I64(value),
                Err(_) => AnyValue::U64(
                    u64::try_from(value)
                        .map_err(|_| fits_err!("value of {} overflows 64 bits", keyword))?,
                ),
            },
            CardValue::Real(value) => AnyValue::F64(value),
            CardValue::Complex(re, im) => AnyValue::C64(Complex64::new(re, im)),
            CardValue::Undefined => fits_bail!("record {} has an undefined value", keyword),
        })
    }
}

/// A parsed card.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Card {
    pub keyword: String,
    pub value: CardValue,
    pub raw_comment: String,
}

/// The keyword of a card, without parsing its value.
pub(crate) fn keyword_of(card: &str) -> &str {
    match card.strip_prefix("HIERARCH ") {
        Some(rest) => rest.split('=').next().unwrap_or_default().trim(),
        None => card.get(..SHORT_KEYWORD_WIDTH).unwrap_or(card).trim_end(),
    }
}

fn check_text(text: &str, what: &str) -> FitsResult<()> {
    if let Some(c) = text.chars().find(|c| !(' '..='~').contains(c)) {
        fits_bail!("{} contains the illegal character {}", what, c.escape_default());
    }
    Ok(())
}

/// Formats a real number in the shortest round-trip scientific notation, with a decimal point.
fn format_real(value: impl std::fmt::UpperExp + Into<f64> + Copy) -> FitsResult<String> {
    let real: f64 = value.into();
    if !real.is_finite() {
        fits_bail!("cannot write non-finite value {}", real);
    }
    let formatted = format!("{value:E}");
    Ok(match formatted.split_once('E') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => {
            format!("{mantissa}.0E{exponent}")
        }
        _ => formatted,
    })
}

fn format_value(value: &AnyValue) -> FitsResult<String> {
    Ok(match value {
        AnyValue::Bool(v) => if *v { "T" } else { "F" }.to_string(),
        AnyValue::I8(v) => v.to_string(),
        AnyValue::U8(v) => v.to_string(),
        AnyValue::I16(v) => v.to_string(),
        AnyValue::U16(v) => v.to_string(),
        AnyValue::I32(v) => v.to_string(),
        AnyValue::U32(v) => v.to_string(),
        AnyValue::I64(v) => v.to_string(),
        AnyValue::U64(v) => v.to_string(),
        AnyValue::F32(v) => format_real(*v)?,
        AnyValue::F64(v) => format_real(*v)?,
        AnyValue::C32(v) => format!("({}, {})", format_real(v.re)?, format_real(v.im)?),
        AnyValue::C64(v) => format!("({}, {})", format_real(v.re)?, format_real(v.im)?),
        AnyValue::Str(v) => format!("'{:<MIN_STRING_WIDTH$}'", v.replace('\'', "''")),
    })
}

fn append_comment(card: &mut String, raw_comment: &str) {
    if !raw_comment.is_empty() && card.len() + 3 < CARD_WIDTH {
        card.push_str(" / ");
        card.push_str(raw_comment);
    }
    card.truncate(CARD_WIDTH);
}

/// Splits a string into pieces whose escaped lengths are at most `first` for the first piece
/// and `next` for the following ones. Quote pairs are never split.
fn split_escaped(value: &str, first: usize, next: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut budget = first;
    let mut used = 0;
    for c in value.chars() {
        let width = if c == '\'' { 2 } else { 1 };
        if used + width > budget {
            pieces.push(std::mem::take(&mut piece));
            budget = next;
            used = 0;
        }
        if c == '\'' {
            piece.push_str("''");
        } else {
            piece.push(c);
        }
        used += width;
    }
    pieces.push(piece);
    pieces
}

/// Formats a record as one card, or as several cards when a string value has to be continued.
pub(crate) fn format_record(record: &Record<AnyValue>) -> FitsResult<Vec<String>> {
    let keyword = &record.keyword;
    let prefix = if is_short_keyword(keyword) {
        format!("{keyword:<SHORT_KEYWORD_WIDTH$}= ")
    } else {
        if keyword.is_empty() || keyword.len() > MAX_HIERARCH_KEYWORD_WIDTH {
            fits_bail!(
                "keyword '{}' must have between 1 and {} characters",
                keyword,
                MAX_HIERARCH_KEYWORD_WIDTH
            );
        }
        check_text(keyword, "keyword")?;
        if keyword.contains('=') {
            fits_bail!("keyword '{}' contains '='", keyword);
        }
        format!("HIERARCH {keyword} = ")
    };
    let raw_comment = record.raw_comment();
    check_text(&raw_comment, "comment")?;

    if let AnyValue::Str(value) = &record.value {
        check_text(value, "string value")?;
        if needs_continuation(prefix.len(), value) {
            return format_long_string(&prefix, value, &raw_comment);
        }
    }

    let value = format_value(&record.value)?;
    let mut card = if is_short_keyword(keyword) && !matches!(record.value, AnyValue::Str(_)) {
        format!("{prefix}{value:>width$}", width = FIXED_VALUE_END - prefix.len())
    } else {
        format!("{prefix}{value}")
    };
    if card.len() > CARD_WIDTH {
        fits_bail!("record {} does not fit on a card", keyword);
    }
    append_comment(&mut card, &raw_comment);
    Ok(vec![card])
}

fn format_long_string(prefix: &str, value: &str, raw_comment: &str) -> FitsResult<Vec<String>> {
    let first = CARD_WIDTH
        .checked_sub(prefix.len() + 3)
        .filter(|&width| width > 1)
        .ok_or_else(|| fits_err!("no room for a string value after {}", prefix.trim_end()))?;
    let next = CARD_WIDTH - CONTINUE_PREFIX.len() - 3;
    let pieces = split_escaped(value, first, next);
    let last = pieces.len() - 1;
    let mut cards = Vec::with_capacity(pieces.len());
    for (i, piece) in pieces.iter().enumerate() {
        let head = if i == 0 { prefix } else { CONTINUE_PREFIX };
        let mut card = if i == last {
            format!("{head}'{piece}'")
        } else {
            format!("{head}'{piece}&'")
        };
        if i == last {
            append_comment(&mut card, raw_comment);
        }
        cards.push(card);
    }
    Ok(cards)
}

/// Parses a quoted string, starting after the opening quote, and the comment which follows it.
fn parse_string(quoted: &str, card: &str) -> FitsResult<(CardValue, String)> {
    let mut value = String::new();
    let mut chars = quoted.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '\'' {
            value.push(c);
        } else if chars.next_if(|&(_, next)| next == '\'').is_some() {
            value.push('\'');
        } else {
            let comment = quoted[i + 1..]
                .trim_start()
                .strip_prefix('/')
                .map(|c| c.trim().to_string())
                .unwrap_or_default();
            return Ok((CardValue::Str(value.trim_end().to_string()), comment));
        }
    }
    fits_bail!("unterminated string in card '{}'", card.trim_end())
}

/// Parses the value and comment part of a card, i.e. what follows `= `.
fn parse_value(text: &str, card: &str) -> FitsResult<(CardValue, String)> {
    let text = text.trim_start();
    if let Some(quoted) = text.strip_prefix('\'') {
        return parse_string(quoted, card);
    }

    let (token, comment) = match text.split_once('/') {
        Some((token, comment)) => (token.trim(), comment.trim().to_string()),
        None => (text.trim(), String::new()),
    };
    let invalid = || fits_err!("cannot parse value '{}' of card '{}'", token, card.trim_end());
    let value = match token {
        "" => CardValue::Undefined,
        "T" => CardValue::Logical(true),
        "F" => CardValue::Logical(false),
        _ if token.starts_with('(') => {
            let inner = token
                .strip_prefix('(')
                .and_then(|t| t.strip_suffix(')'))
                .ok_or_else(invalid)?;
            let (re, im) = inner.split_once(',').ok_or_else(invalid)?;
            CardValue::Complex(parse_real(re).ok_or_else(invalid)?, parse_real(im).ok_or_else(invalid)?)
        }
        _ if token.contains(['.', 'E', 'e', 'D', 'd']) => {
            CardValue::Real(parse_real(token).ok_or_else(invalid)?)
        }
        _ => CardValue::Integer(token.parse().map_err(|_| invalid())?),
    };
    Ok((value, comment))
}

fn parse_real(token: &str) -> Option<f64> {
    token.trim().replace(['D', 'd'], "E").parse().ok()
}

/// Parses a single card.
///
/// Commentary cards (`COMMENT`, `HISTORY`, blank keywords...) have an undefined value and
/// their text as comment. `CONTINUE` cards have their string as value.
pub(crate) fn parse_card(card: &str) -> FitsResult<Card> {
    if let Some(rest) = card.strip_prefix("HIERARCH ") {
        let Some((keyword, text)) = rest.split_once('=') else {
            fits_bail!("missing value indicator in card '{}'", card.trim_end());
        };
        let (value, raw_comment) = parse_value(text, card)?;
        return Ok(Card {
            keyword: keyword.trim().to_string(),
            value,
            raw_comment,
        });
    }
    let keyword = keyword_of(card).to_string();
    let tail = card.get(SHORT_KEYWORD_WIDTH..).unwrap_or_default();
    if keyword == CONTINUE {
        let (value, raw_comment) = parse_value(tail, card)?;
        return Ok(Card {
            keyword,
            value,
            raw_comment,
        });
    }
    match tail.strip_prefix("= ") {
        Some(text) => {
            let (value, raw_comment) = parse_value(text, card)?;
            Ok(Card {
                keyword,
                value,
                raw_comment,
            })
        }
        None => Ok(Card {
            keyword,
            value: CardValue::Undefined,
            raw_comment: tail.trim().to_string(),
        }),
    }
}

/// Parses the record starting at `cards[0]`, joining `CONTINUE` cards.
///
/// Returns the card and the number of cards it spans.
pub(crate) fn parse_record_cards(cards: &[String]) -> FitsResult<(Card, usize)> {
    let Some(first) = cards.first() else {
        fits_bail!("no card to parse");
    };
    let mut card = parse_card(first)?;
    let mut span = 1;
    while let Some(next) = cards.get(span).filter(|next| keyword_of(next) == CONTINUE) {
        let CardValue::Str(value) = &mut card.value else {
            break;
        };
        if !value.ends_with('&') {
            break;
        }
        value.pop();
        let next = parse_card(next)?;
        let CardValue::Str(piece) = next.value else {
            fits_bail!("continuation of {} is not a string", card.keyword);
        };
        value.push_str(&piece);
        card.raw_comment = next.raw_comment;
        span += 1;
    }
    Ok((card, span))
}

/// Splits a raw comment into unit and comment.
///
/// A raw comment `[unit] comment` gives `unit` and `comment`. When the remaining comment is
/// exactly the unit, it is cleared.
pub(crate) fn split_raw_comment(raw_comment: &str) -> (String, String) {
    let Some((unit, comment)) = raw_comment
        .strip_prefix('[')
        .and_then(|rest| rest.split_once(']'))
    else {
        return (String::new(), raw_comment.to_string());
    };
    let comment = comment.strip_prefix(' ').unwrap_or(comment);
    if comment == unit {
        (unit.to_string(), String::new())
    } else {
        (unit.to_string(), comment.to_string())
    }
}
