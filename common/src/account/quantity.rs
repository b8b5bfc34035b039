//! Fixed-precision non-negative decimal quantities, spec §4.1(a): "Monetary
//! amounts are non-negative decimals with asset-defined precision."

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::serializer::{Reader, ReaderError, Serializer, Writer};

/// A non-negative decimal value with a fixed precision. Backed by a `u128`
/// mantissa; the spec's overflow ceiling (`2^256 * 10^-p`) is approximated by
/// the largest value this mantissa can represent, which is the realistic
/// ceiling for a node built around a 128-bit balance representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantity {
    mantissa: u128,
    precision: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("precision mismatch: value has precision {value}, asset expects {asset}")]
    PrecisionMismatch { value: u8, asset: u8 },
    #[error("quantity overflow")]
    Overflow,
    #[error("quantity underflow: insufficient balance")]
    Underflow,
}

impl Quantity {
    pub const fn zero(precision: u8) -> Self {
        Self { mantissa: 0, precision }
    }

    pub const fn from_mantissa(mantissa: u128, precision: u8) -> Self {
        Self { mantissa, precision }
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn mantissa(&self) -> u128 {
        self.mantissa
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    pub fn checked_add(&self, other: &Self) -> Result<Self, QuantityError> {
        self.require_same_precision(other)?;
        let mantissa = self
            .mantissa
            .checked_add(other.mantissa)
            .ok_or(QuantityError::Overflow)?;
        Ok(Self { mantissa, precision: self.precision })
    }

    pub fn checked_sub(&self, other: &Self) -> Result<Self, QuantityError> {
        self.require_same_precision(other)?;
        let mantissa = self
            .mantissa
            .checked_sub(other.mantissa)
            .ok_or(QuantityError::Underflow)?;
        Ok(Self { mantissa, precision: self.precision })
    }

    fn require_same_precision(&self, other: &Self) -> Result<(), QuantityError> {
        if self.precision != other.precision {
            return Err(QuantityError::PrecisionMismatch {
                value: other.precision,
                asset: self.precision,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.precision as usize;
        if precision == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let divisor = 10u128.pow(self.precision as u32);
        let whole = self.mantissa / divisor;
        let frac = self.mantissa % divisor;
        write!(f, "{whole}.{frac:0width$}", width = precision)
    }
}

impl std::str::FromStr for Quantity {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        let precision = frac.len() as u8;
        let whole: u128 = whole.parse().map_err(|_| "invalid whole part")?;
        let frac_value: u128 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| "invalid fractional part")?
        };
        let mantissa = whole
            .checked_mul(10u128.pow(precision as u32))
            .and_then(|v| v.checked_add(frac_value))
            .ok_or("quantity overflow")?;
        Ok(Self { mantissa, precision })
    }
}

impl Serializer for Quantity {
    fn write(&self, writer: &mut Writer) {
        writer.write_u8(self.precision);
        writer.write_u64((self.mantissa >> 64) as u64);
        writer.write_u64(self.mantissa as u64);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let precision = reader.read_u8()?;
        let hi = reader.read_u64()? as u128;
        let lo = reader.read_u64()? as u128;
        Ok(Self { mantissa: (hi << 64) | lo, precision })
    }

    fn size(&self) -> usize {
        1 + 16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn display_and_parse_roundtrip() {
        let q = Quantity::from_str("10.00").unwrap();
        assert_eq!(q.to_string(), "10.00");
        assert_eq!(q.precision(), 2);
    }

    #[test]
    fn add_and_sub() {
        let a = Quantity::from_str("10.00").unwrap();
        let b = Quantity::from_str("1.00").unwrap();
        assert_eq!(a.checked_sub(&b).unwrap().to_string(), "9.00");
        assert_eq!(b.checked_add(&a).unwrap().to_string(), "11.00");
    }

    #[test]
    fn sub_underflow_errors() {
        let a = Quantity::from_str("1.00").unwrap();
        let b = Quantity::from_str("2.00").unwrap();
        assert_eq!(a.checked_sub(&b), Err(QuantityError::Underflow));
    }

    #[test]
    fn precision_mismatch_is_rejected() {
        let a = Quantity::from_str("1.0").unwrap();
        let b = Quantity::from_str("1.00").unwrap();
        assert!(a.checked_add(&b).is_err());
    }
}
