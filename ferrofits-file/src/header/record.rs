use std::fmt::{Display, Formatter};

use ferrofits_dtype::AnyValue;
use ferrofits_error::{FitsError, FitsResult};

use crate::header::card::{is_short_keyword, needs_continuation, value_prefix_len};

/// The length above which a string value cannot fit on a single card after a standard keyword.
pub const MAX_SHORT_VALUE_LENGTH: usize = 68;

/// A keyword record: keyword, value, unit and comment.
///
/// On the wire, the unit is stored at the beginning of the comment, between square brackets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<T> {
    /// The keyword.
    pub keyword: String,
    /// The value.
    pub value: T,
    /// The unit, possibly empty.
    pub unit: String,
    /// The comment, possibly empty.
    pub comment: String,
}

impl<T> Record<T> {
    /// Creates a record without unit nor comment.
    pub fn new(keyword: impl Into<String>, value: T) -> Self {
        Self {
            keyword: keyword.into(),
            value,
            unit: String::new(),
            comment: String::new(),
        }
    }

    /// Sets the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets the comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// The comment as written on the card: `[unit] comment`, or `comment` if there is no unit.
    pub fn raw_comment(&self) -> String {
        if self.unit.is_empty() {
            self.comment.clone()
        } else {
            format!("[{}] {}", self.unit, self.comment)
        }
    }

    /// Returns `true` if the keyword requires the `HIERARCH` convention.
    pub fn has_long_keyword(&self) -> bool {
        !is_short_keyword(&self.keyword)
    }

    /// Converts the value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Record<U> {
        Record {
            keyword: self.keyword,
            value: f(self.value),
            unit: self.unit,
            comment: self.comment,
        }
    }
}

impl<T: Clone + Into<AnyValue>> Record<T> {
    /// Returns `true` if the value is a string which has to be continued over several cards.
    ///
    /// A `HIERARCH` keyword leaves less room than [`MAX_SHORT_VALUE_LENGTH`] for the value.
    pub fn has_long_string_value(&self) -> bool {
        match self.value.clone().into() {
            AnyValue::Str(value) => needs_continuation(value_prefix_len(&self.keyword), &value),
            _ => false,
        }
    }

    /// A copy with a dynamically typed value.
    pub fn to_any(&self) -> Record<AnyValue> {
        self.clone().map(Into::into)
    }
}

impl Record<AnyValue> {
    /// Casts the value to a native type.
    pub fn cast<U: TryFrom<AnyValue, Error = FitsError>>(self) -> FitsResult<Record<U>> {
        let Record {
            keyword,
            value,
            unit,
            comment,
        } = self;
        Ok(Record {
            keyword,
            value: U::try_from(value)?,
            unit,
            comment,
        })
    }
}

/// The policy of a record write, when a record with the same keyword may already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordMode {
    /// Updates the record if the keyword exists, appends it otherwise.
    #[default]
    CreateOrUpdate,
    /// Appends the record, fails with [`FitsError::AlreadyExists`] if the keyword exists.
    CreateUnique,
    /// Appends the record, even if the keyword already exists.
    CreateNew,
    /// Updates the record, fails with [`FitsError::NotFound`] if the keyword does not exist.
    UpdateExisting,
}

impl Display for RecordMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordMode::CreateOrUpdate => write!(f, "create-or-update"),
            RecordMode::CreateUnique => write!(f, "create-unique"),
            RecordMode::CreateNew => write!(f, "create-new"),
            RecordMode::UpdateExisting => write!(f, "update-existing"),
        }
    }
}
