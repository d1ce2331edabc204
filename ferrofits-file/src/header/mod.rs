//! Header records: reading, parsing and writing keyword records.

pub use record::*;

pub(crate) mod card;
mod record;

use ferrofits_dtype::{AnyValue, RecordType, ValueType};
use ferrofits_error::{FitsResult, ResultExt, fits_bail, fits_err};
use ferrofits_io::{StatusContext, Transport};

use crate::header::card::{
    CONTINUE, CardValue, LONGSTRN, format_record, keyword_of, parse_record_cards,
    split_raw_comment,
};

/// A handle to the header of the current HDU.
///
/// Keywords are matched case-insensitively. A record whose string value spans several cards
/// is read, updated and removed as a whole.
pub struct Header<'a, H: Transport> {
    transport: &'a mut H,
}

/// The location of a record: first card (0-based) and number of cards.
#[derive(Debug, Clone, Copy)]
struct Span {
    first: usize,
    len: usize,
}

fn matches_keyword(card: &str, keyword: &str) -> bool {
    keyword_of(card).eq_ignore_ascii_case(keyword)
}

impl<'a, H: Transport> Header<'a, H> {
    /// Creates a handle to the header of the current HDU.
    pub fn new(transport: &'a mut H) -> Self {
        Self { transport }
    }

    fn cards(&self) -> FitsResult<Vec<String>> {
        let count = self.transport.card_count().context("cannot count cards")?;
        (1..=count)
            .map(|n| {
                self.transport
                    .read_card(n)
                    .with_context(|| format!("cannot read card {n}"))
            })
            .collect()
    }

    fn find(cards: &[String], keyword: &str) -> FitsResult<Option<Span>> {
        if keyword.eq_ignore_ascii_case(CONTINUE) {
            return Ok(None);
        }
        let Some(first) = cards.iter().position(|card| matches_keyword(card, keyword)) else {
            return Ok(None);
        };
        let (_, len) = parse_record_cards(&cards[first..])?;
        Ok(Some(Span { first, len }))
    }

    fn parse_at(cards: &[String], keyword: &str) -> FitsResult<(Record<AnyValue>, bool)> {
        let Some(span) = Self::find(cards, keyword)? else {
            fits_bail!(NotFound: "keyword {}", keyword);
        };
        let (card, _) = parse_record_cards(&cards[span.first..])?;
        let (unit, comment) = split_raw_comment(&card.raw_comment);
        let undefined = card.value == CardValue::Undefined;
        let value = if undefined {
            AnyValue::Str(String::new())
        } else {
            card.value.into_any(&card.keyword)?
        };
        let record = Record::new(card.keyword, value)
            .with_unit(unit)
            .with_comment(comment);
        Ok((record, undefined))
    }

    fn parse_typed<T: RecordType>(cards: &[String], keyword: &str) -> FitsResult<Record<T>> {
        let (record, undefined) = Self::parse_at(cards, keyword)?;
        if undefined && T::VALUE_TYPE != ValueType::Str {
            fits_bail!("record {} has no value to parse as {}", keyword, T::VALUE_TYPE);
        }
        record
            .cast::<T>()
            .with_context(|| format!("cannot parse record {keyword}"))
    }

    /// Returns `true` if a record with this keyword exists.
    pub fn has(&self, keyword: &str) -> FitsResult<bool> {
        if keyword.eq_ignore_ascii_case(CONTINUE) {
            return Ok(false);
        }
        Ok(self.cards()?.iter().any(|card| matches_keyword(card, keyword)))
    }

    /// The whole header as a single string of 80-character cards.
    pub fn read_all(&self) -> FitsResult<String> {
        Ok(self.cards()?.concat())
    }

    /// The keywords of the records, in order, without continuation cards.
    pub fn read_keywords(&self) -> FitsResult<Vec<String>> {
        Ok(self
            .cards()?
            .iter()
            .map(|card| keyword_of(card))
            .filter(|keyword| !keyword.is_empty() && *keyword != CONTINUE)
            .map(String::from)
            .collect())
    }

    /// Parses a record as `T`.
    ///
    /// Fails with [`FitsError::NotFound`](ferrofits_error::FitsError::NotFound) if the keyword
    /// does not exist. A record without value parses as an empty string.
    pub fn parse<T: RecordType>(&self, keyword: &str) -> FitsResult<Record<T>> {
        Self::parse_typed(&self.cards()?, keyword)
    }

    /// Parses a record as `T`, or returns `fallback` if the keyword does not exist.
    pub fn parse_or<T: RecordType>(&self, fallback: Record<T>) -> FitsResult<Record<T>> {
        let cards = self.cards()?;
        if Self::find(&cards, &fallback.keyword)?.is_none() {
            return Ok(fallback);
        }
        Self::parse_typed(&cards, &fallback.keyword)
    }

    /// Parses a record with the type deduced from its value.
    ///
    /// Integers are parsed as `i64` (or `u64` beyond), reals as `f64` and complex numbers as
    /// `Complex64`.
    pub fn parse_any(&self, keyword: &str) -> FitsResult<Record<AnyValue>> {
        let (record, undefined) = Self::parse_at(&self.cards()?, keyword)?;
        if undefined {
            fits_bail!("record {} has no value", keyword);
        }
        Ok(record)
    }

    /// Parses several records of the same type, reading the header once.
    pub fn parse_seq<T: RecordType>(&self, keywords: &[&str]) -> FitsResult<Vec<Record<T>>> {
        let cards = self.cards()?;
        keywords
            .iter()
            .map(|keyword| Self::parse_typed(&cards, keyword))
            .collect()
    }

    fn check_writable(&self) -> FitsResult<()> {
        let mode = self.transport.mode();
        if !mode.is_writable() {
            fits_bail!(ReadOnly: "cannot write records in a {} header", mode);
        }
        Ok(())
    }

    fn insert_cards(&mut self, first: usize, cards: &[String]) -> FitsResult<()> {
        for (i, card) in cards.iter().enumerate() {
            self.transport
                .insert_card(first + i + 1, card)
                .with_context(|| format!("cannot insert card {}", first + i + 1))?;
        }
        Ok(())
    }

    fn delete_span(&mut self, span: Span) -> FitsResult<()> {
        for _ in 0..span.len {
            self.transport
                .delete_card(span.first + 1)
                .with_context(|| format!("cannot delete card {}", span.first + 1))?;
        }
        Ok(())
    }

    /// Writes a record according to `mode`.
    ///
    /// String values too long for one card are continued over `CONTINUE` cards, preceded once per
    /// header by the `LONGSTRN` warning record.
    pub fn write<T: Clone + Into<AnyValue>>(
        &mut self,
        record: &Record<T>,
        mode: RecordMode,
    ) -> FitsResult<()> {
        self.check_writable()?;
        let formatted = format_record(&record.to_any())?;
        let cards = self.cards()?;
        let existing = Self::find(&cards, &record.keyword)?;
        let target = match (mode, existing) {
            (RecordMode::CreateUnique, Some(_)) => {
                fits_bail!(AlreadyExists: "keyword {}", record.keyword)
            }
            (RecordMode::UpdateExisting, None) => {
                fits_bail!(NotFound: "keyword {}", record.keyword)
            }
            (RecordMode::CreateOrUpdate | RecordMode::UpdateExisting, Some(span)) => Some(span),
            _ => None,
        };
        log::debug!(
            "writing record {} ({}, {} continuation cards)",
            record.keyword,
            mode,
            formatted.len() - 1
        );

        let mut first = match target {
            Some(span) => {
                self.delete_span(span)?;
                span.first
            }
            None => cards.len(),
        };
        if formatted.len() > 1 && Self::find(&cards, LONGSTRN)?.is_none() {
            let warning = format_record(
                &Record::new(LONGSTRN, AnyValue::from("OGIP 1.0"))
                    .with_comment("The OGIP long string convention may be used."),
            )?;
            self.insert_cards(first, &warning)?;
            first += warning.len();
        }
        self.insert_cards(first, &formatted)
    }

    /// Writes several records with the same mode.
    pub fn write_seq<T: Clone + Into<AnyValue>>(
        &mut self,
        records: &[Record<T>],
        mode: RecordMode,
    ) -> FitsResult<()> {
        records
            .iter()
            .try_for_each(|record| self.write(record, mode))
    }

    /// Removes a record, with its continuation cards.
    pub fn remove(&mut self, keyword: &str) -> FitsResult<()> {
        self.check_writable()?;
        let Some(span) = Self::find(&self.cards()?, keyword)? else {
            return Err(fits_err!(NotFound: "keyword {}", keyword));
        };
        log::debug!("removing record {} ({} cards)", keyword, span.len);
        self.delete_span(span)
    }
}
