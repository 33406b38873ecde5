// Copyright (C) 2020-2026  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! The TD3 machine-readable zone, per [ICAO Doc 9303 Part 4][1].
//!
//! A TD3 MRZ is two 44-character lines.  Check digits use the weighted 7-3-1 scheme over the
//! character values `0-9 → 0-9`, `A-Z → 10-35`, `< → 0`, modulo 10.  Decoding validates every
//! check digit including the composite one; a mismatch is a decode failure.
//!
//! [1]: <https://www.icao.int/publications/Documents/9303_p4_cons_en.pdf>

use poerror::traits::ErrorContext as _;
use serde::{Deserialize, Serialize};

use crate::{error::DtcError, Result};

/// Length of each TD3 MRZ line.
pub const TD3_LINE_LENGTH: usize = 44;

/// The check-digit weights, applied cyclically.
const WEIGHTS: [u32; 3] = [7, 3, 1];

/// The parsed fields of a TD3 MRZ.
///
/// Field values are stored in MRZ form (uppercase, `<` as filler) but without padding; `encode`
/// re-pads them to the fixed field widths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mrz {
    /// Issuing state, a three-letter code.
    pub issuing_state: String,
    /// The name field, `SURNAME<<GIVEN<NAMES` in MRZ convention.
    pub name: String,
    /// Document number, up to nine characters.
    pub document_number: String,
    /// Nationality, a three-letter code.
    pub nationality: String,
    /// Date of birth, `YYMMDD`.
    pub birth_date: String,
    /// Sex, `M`, `F` or `<`.
    pub sex: char,
    /// Date of expiry, `YYMMDD`.
    pub expiry_date: String,
    /// Personal number, up to fourteen characters.
    pub personal_number: String,
}

impl Mrz {
    /// Encode the MRZ as its two 44-character lines, computing all check digits.
    ///
    /// # Errors
    ///
    /// [`DtcError::InvalidInput`] if a field exceeds its width or contains characters outside
    /// the MRZ alphabet.
    pub fn encode(&self) -> Result<[String; 2]> {
        if !matches!(self.sex, 'M' | 'F' | '<') {
            return Err(poerror::Error::root(DtcError::InvalidInput(format!(
                "sex must be M, F or <, not '{}'",
                self.sex
            ))));
        }

        let line1 = format!(
            "P<{}{}",
            pad("issuing state", &self.issuing_state, 3)?,
            pad("name", &self.name, 39)?,
        );

        let mut line2 = String::with_capacity(TD3_LINE_LENGTH);
        let document_number = pad("document number", &self.document_number, 9)?;
        line2.push_str(&document_number);
        line2.push(digit_char(check_digit(&document_number)?));
        line2.push_str(&pad("nationality", &self.nationality, 3)?);
        let birth_date = pad("birth date", &self.birth_date, 6)?;
        line2.push_str(&birth_date);
        line2.push(digit_char(check_digit(&birth_date)?));
        line2.push(self.sex);
        let expiry_date = pad("expiry date", &self.expiry_date, 6)?;
        line2.push_str(&expiry_date);
        line2.push(digit_char(check_digit(&expiry_date)?));
        let personal_number = pad("personal number", &self.personal_number, 14)?;
        line2.push_str(&personal_number);
        line2.push(digit_char(check_digit(&personal_number)?));
        line2.push(digit_char(composite_check_digit(&line2)?));

        debug_assert_eq!(line1.len(), TD3_LINE_LENGTH);
        debug_assert_eq!(line2.len(), TD3_LINE_LENGTH);

        Ok([line1, line2])
    }

    /// Decode and validate a TD3 MRZ from its two lines.
    ///
    /// # Errors
    ///
    ///   * [`DtcError::Decode`] if a line has the wrong length or alphabet.
    ///   * [`DtcError::InvalidCheckDigit`] if any check digit (including the composite one)
    ///     does not match its field.
    pub fn decode(line1: &str, line2: &str) -> Result<Self> {
        if line1.len() != TD3_LINE_LENGTH || line2.len() != TD3_LINE_LENGTH {
            return Err(poerror::Error::root(DtcError::Decode(format!(
                "TD3 MRZ lines must have {TD3_LINE_LENGTH} characters"
            ))));
        }
        // The MRZ alphabet is a subset of ASCII; the fixed-range slicing below relies on it.
        if !line1.is_ascii() || !line2.is_ascii() {
            return Err(poerror::Error::root(DtcError::Decode(
                "TD3 MRZ lines must be ASCII".to_owned(),
            )));
        }
        if !line1.starts_with("P<") {
            return Err(poerror::Error::root(DtcError::Decode(
                "TD3 MRZ must describe a passport-type document".to_owned(),
            )));
        }

        let field = |line: &str, range: std::ops::Range<usize>| line[range].to_owned();

        let document_number = field(line2, 0..9);
        validate_check_digit("document number", &document_number, &line2[9..10])?;
        let birth_date = field(line2, 13..19);
        validate_check_digit("birth date", &birth_date, &line2[19..20])?;
        let expiry_date = field(line2, 21..27);
        validate_check_digit("expiry date", &expiry_date, &line2[27..28])?;
        let personal_number = field(line2, 28..42);
        validate_check_digit("personal number", &personal_number, &line2[42..43])?;

        let sex = line2.as_bytes()[20] as char;
        if !matches!(sex, 'M' | 'F' | '<') {
            return Err(poerror::Error::root(DtcError::Decode(format!(
                "sex must be M, F or <, not '{sex}'"
            ))));
        }

        let mut composite_input = String::new();
        composite_input.push_str(&line2[0..10]);
        composite_input.push_str(&line2[13..20]);
        composite_input.push_str(&line2[21..43]);
        validate_check_digit("composite", &composite_input, &line2[43..44])?;

        Ok(Self {
            issuing_state: unpad(&field(line1, 2..5)),
            name: unpad(&field(line1, 5..44)),
            document_number: unpad(&document_number),
            nationality: unpad(&field(line2, 10..13)),
            birth_date,
            sex,
            expiry_date,
            personal_number: unpad(&personal_number),
        })
    }
}

/// Compute the 7-3-1 check digit of an MRZ field.
///
/// # Errors
///
/// [`DtcError::InvalidInput`] if the field contains characters outside the MRZ alphabet.
pub fn check_digit(field: &str) -> Result<u32> {
    let mut sum = 0;
    for (i, c) in field.chars().enumerate() {
        sum += char_value(c)? * WEIGHTS[i % 3];
    }
    Ok(sum % 10)
}

fn char_value(c: char) -> Result<u32> {
    match c {
        '0'..='9' => Ok(c as u32 - '0' as u32),
        'A'..='Z' => Ok(c as u32 - 'A' as u32 + 10),
        '<' => Ok(0),
        _ => Err(poerror::Error::root(DtcError::InvalidInput(format!(
            "character '{c}' is not in the MRZ alphabet"
        )))),
    }
}

fn composite_check_digit(line2: &str) -> Result<u32> {
    let mut input = String::new();
    input.push_str(&line2[0..10]);
    input.push_str(&line2[13..20]);
    input.push_str(&line2[21..43]);
    check_digit(&input)
}

fn validate_check_digit(field_name: &str, field: &str, digit: &str) -> Result<()> {
    let expected = check_digit(field)
        .ctx(|| format!("while validating the {field_name} check digit"))?;

    if digit != expected.to_string() {
        return Err(poerror::Error::root(DtcError::InvalidCheckDigit(
            field_name.to_owned(),
        )));
    }

    Ok(())
}

fn digit_char(digit: u32) -> char {
    char::from_digit(digit, 10).expect("check digits are mod 10")
}

fn pad(field_name: &str, value: &str, width: usize) -> Result<String> {
    if value.len() > width {
        return Err(poerror::Error::root(DtcError::InvalidInput(format!(
            "{field_name} exceeds {width} characters"
        ))));
    }
    for c in value.chars() {
        char_value(c).ctx(|| format!("in the {field_name} field"))?;
    }

    let mut padded = value.to_owned();
    padded.extend(std::iter::repeat('<').take(width - value.len()));
    Ok(padded)
}

fn unpad(value: &str) -> String {
    value.trim_end_matches('<').to_owned()
}
