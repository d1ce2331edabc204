use std::fmt::{Display, Formatter};
use std::str::FromStr;

use ferrofits_error::{FitsError, FitsResult, fits_bail, fits_err};

use crate::ValueType;

/// A binary table column format, as stored in the `TFORMn` keywords: a repeat count followed by
/// a type letter, e.g. `2D` or `10A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TForm {
    repeat: i64,
    value_type: ValueType,
}

impl TForm {
    /// Creates a format from its components.
    ///
    /// For string columns, the repeat count is the maximum width in bytes.
    pub fn new(repeat: i64, value_type: ValueType) -> FitsResult<Self> {
        if repeat < 0 {
            fits_bail!("negative repeat count {} in column format", repeat);
        }
        Ok(Self { repeat, value_type })
    }

    /// The number of elements (or characters) per cell.
    pub fn repeat(&self) -> i64 {
        self.repeat
    }

    /// The element type.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Parses a format like `1J`, `J` or `32A`.
    pub fn parse(tform: &str) -> FitsResult<Self> {
        let tform = tform.trim();
        let split = tform
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(tform.len());
        let (digits, rest) = tform.split_at(split);
        let mut letters = rest.chars();
        let Some(letter) = letters.next() else {
            fits_bail!("missing type letter in column format '{}'", tform);
        };
        if letters.next().is_some() {
            fits_bail!(UnsupportedType: "unsupported column format '{}'", tform);
        }
        let repeat = if digits.is_empty() {
            1
        } else {
            digits
                .parse::<i64>()
                .map_err(|e| fits_err!("invalid repeat count in column format '{}': {}", tform, e))?
        };
        Self::new(repeat, ValueType::from_tform_char(letter)?)
    }
}

impl FromStr for TForm {
    type Err = FitsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for TForm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.repeat, self.value_type.tform_char())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("2D", 2, ValueType::F64)]
    #[case("1J", 1, ValueType::I32)]
    #[case("J", 1, ValueType::I32)]
    #[case("10A", 10, ValueType::Str)]
    #[case("30M", 30, ValueType::C64)]
    #[case(" 1L ", 1, ValueType::Bool)]
    fn parse(#[case] text: &str, #[case] repeat: i64, #[case] vt: ValueType) {
        let tform = TForm::parse(text).unwrap();
        assert_eq!(tform.repeat(), repeat);
        assert_eq!(tform.value_type(), vt);
    }

    #[test]
    fn display_always_shows_repeat() {
        assert_eq!(TForm::new(1, ValueType::I32).unwrap().to_string(), "1J");
        assert_eq!("E".parse::<TForm>().unwrap().to_string(), "1E");
    }

    #[rstest]
    #[case("")]
    #[case("3")]
    #[case("2Q")]
    #[case("1PJ")]
    fn malformed(#[case] text: &str) {
        assert!(TForm::parse(text).is_err());
    }
}
