//! Byte-exact stringification of logically annotated values, used when
//! statistics and diagnostics are rendered. One typed function per
//! annotation; dispatch happens on the schema's primitive kind, so an
//! unsupported combination cannot be reached at runtime.

use chrono::{DateTime, NaiveDate};
use parq_format::basic::{LogicalType, TimeUnit};

use crate::record::PrimitiveValue;
use crate::schema::descriptor::ColumnDescriptor;

const INVALID: &str = "<INVALID>";

/// Days from CE (0001-01-01) to the Unix epoch.
const EPOCH_CE_DAYS: i32 = 719_163;

/// DATE: `YYYY-MM-DD` in the UTC proleptic Gregorian calendar.
pub fn format_date(days_since_epoch: i32) -> String {
    match NaiveDate::from_num_days_from_ce_opt(days_since_epoch.wrapping_add(EPOCH_CE_DAYS)) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => INVALID.to_string(),
    }
}

fn format_time(value: i64, per_second: i64, frac_width: usize) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    let per_second = per_second as u64;
    let frac = abs % per_second;
    let seconds_total = abs / per_second;
    format!(
        "{}{:02}:{:02}:{:02}.{:0width$}",
        sign,
        seconds_total / 3600,
        (seconds_total / 60) % 60,
        seconds_total % 60,
        frac,
        width = frac_width
    )
}

/// TIME_MILLIS: `[-]HH:MM:SS.fff`, the hour part unbounded.
pub fn format_time_millis(millis: i32) -> String {
    format_time(millis as i64, 1_000, 3)
}

pub fn format_time_micros(micros: i64) -> String {
    format_time(micros, 1_000_000, 6)
}

pub fn format_time_nanos(nanos: i64) -> String {
    format_time(nanos, 1_000_000_000, 9)
}

/// TIMESTAMP: `YYYY-MM-DDThh:mm:ss.fff...` UTC, fraction width by unit.
pub fn format_timestamp(value: i64, unit: TimeUnit) -> String {
    let (per_second, frac_width) = match unit {
        TimeUnit::Millis => (1_000i64, 3usize),
        TimeUnit::Micros => (1_000_000, 6),
        TimeUnit::Nanos => (1_000_000_000, 9),
    };
    let seconds = value.div_euclid(per_second);
    let frac = value.rem_euclid(per_second) as u32;
    let nanos = frac as i64 * (1_000_000_000 / per_second);
    match DateTime::from_timestamp(seconds, nanos as u32) {
        Some(ts) => format!(
            "{}.{:0width$}",
            ts.format("%Y-%m-%dT%H:%M:%S"),
            frac,
            width = frac_width
        ),
        None => INVALID.to_string(),
    }
}

/// INTERVAL: twelve bytes holding three little-endian u32s.
pub fn format_interval(bytes: &[u8]) -> String {
    if bytes.len() != 12 {
        return INVALID.to_string();
    }
    let word = |i: usize| u32::from_le_bytes(bytes[i * 4..(i + 1) * 4].try_into().unwrap());
    format!(
        "interval({} months, {} days, {} millis)",
        word(0),
        word(1),
        word(2)
    )
}

/// DECIMAL from an already-extracted unscaled integer.
pub fn format_decimal_int(unscaled: i128, scale: i32) -> String {
    format_decimal_digits(unscaled < 0, unscaled.unsigned_abs().to_string(), scale)
}

/// DECIMAL from a two's-complement big-endian binary of any width.
pub fn format_decimal_be(bytes: &[u8], scale: i32) -> String {
    if bytes.is_empty() {
        return format_decimal_digits(false, "0".to_string(), scale);
    }
    let negative = bytes[0] & 0x80 != 0;
    // magnitude = bytes when positive, two's complement negation when negative
    let mut magnitude = bytes.to_vec();
    if negative {
        for byte in magnitude.iter_mut() {
            *byte = !*byte;
        }
        for byte in magnitude.iter_mut().rev() {
            let (sum, carry) = byte.overflowing_add(1);
            *byte = sum;
            if !carry {
                break;
            }
        }
    }
    format_decimal_digits(negative, magnitude_to_decimal(&magnitude), scale)
}

/// Base-256 big-endian magnitude to decimal digits via repeated division.
fn magnitude_to_decimal(magnitude: &[u8]) -> String {
    let mut work: Vec<u8> = magnitude.to_vec();
    let mut digits = Vec::new();
    while work.iter().any(|&b| b != 0) {
        let mut remainder = 0u32;
        for byte in work.iter_mut() {
            let cur = remainder * 256 + *byte as u32;
            *byte = (cur / 10) as u8;
            remainder = cur % 10;
        }
        digits.push(b'0' + remainder as u8);
    }
    if digits.is_empty() {
        digits.push(b'0');
    }
    digits.reverse();
    String::from_utf8(digits).unwrap()
}

/// Places the decimal point `scale` digits from the right, keeping exactly
/// `scale` fractional digits.
fn format_decimal_digits(negative: bool, digits: String, scale: i32) -> String {
    let sign = if negative { "-" } else { "" };
    if scale <= 0 {
        return format!("{}{}", sign, digits);
    }
    let scale = scale as usize;
    let digits = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
    } else {
        digits
    };
    let split = digits.len() - scale;
    format!("{}{}.{}", sign, &digits[..split], &digits[split..])
}

pub fn format_unsigned_i32(value: i32, bit_width: i8) -> String {
    match bit_width {
        8 => (value as u8).to_string(),
        16 => (value as u16).to_string(),
        _ => (value as u32).to_string(),
    }
}

pub fn format_unsigned_i64(value: i64) -> String {
    (value as u64).to_string()
}

/// Renders a value the way the column's annotation dictates, falling back to
/// the physical form for unannotated columns.
pub fn stringify(desc: &ColumnDescriptor, value: &PrimitiveValue) -> String {
    match (desc.logical.as_ref(), value) {
        (Some(LogicalType::Date), PrimitiveValue::Int32(v)) => format_date(*v),
        (Some(LogicalType::Time { unit, .. }), v) => match (unit, v) {
            (TimeUnit::Millis, PrimitiveValue::Int32(v)) => format_time_millis(*v),
            (TimeUnit::Micros, PrimitiveValue::Int64(v)) => format_time_micros(*v),
            (TimeUnit::Nanos, PrimitiveValue::Int64(v)) => format_time_nanos(*v),
            _ => INVALID.to_string(),
        },
        (Some(LogicalType::Timestamp { unit, .. }), PrimitiveValue::Int64(v)) => {
            format_timestamp(*v, *unit)
        }
        (Some(LogicalType::Interval), PrimitiveValue::Bytes(v)) => format_interval(v.as_bytes()),
        (Some(LogicalType::Decimal { scale, .. }), v) => match v {
            PrimitiveValue::Int32(v) => format_decimal_int(*v as i128, *scale),
            PrimitiveValue::Int64(v) => format_decimal_int(*v as i128, *scale),
            PrimitiveValue::Bytes(v) => format_decimal_be(v.as_bytes(), *scale),
            _ => INVALID.to_string(),
        },
        (
            Some(LogicalType::Integer {
                is_signed: false,
                bit_width,
            }),
            PrimitiveValue::Int32(v),
        ) => format_unsigned_i32(*v, *bit_width),
        (
            Some(LogicalType::Integer {
                is_signed: false, ..
            }),
            PrimitiveValue::Int64(v),
        ) => format_unsigned_i64(*v),
        (Some(LogicalType::String | LogicalType::Enum | LogicalType::Json), PrimitiveValue::Bytes(v)) => {
            String::from_utf8_lossy(v.as_bytes()).into_owned()
        }
        (_, PrimitiveValue::Boolean(v)) => v.to_string(),
        (_, PrimitiveValue::Int32(v)) => v.to_string(),
        (_, PrimitiveValue::Int64(v)) => v.to_string(),
        (_, PrimitiveValue::Float(v)) => v.to_string(),
        (_, PrimitiveValue::Double(v)) => v.to_string(),
        (_, PrimitiveValue::Int96(v)) => format!("{:?}", v),
        (_, PrimitiveValue::Bytes(v)) => format!("{:?}", v.as_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_epoch_and_around() {
        assert_eq!(format_date(0), "1970-01-01");
        assert_eq!(format_date(1), "1970-01-02");
        assert_eq!(format_date(-1), "1969-12-31");
        assert_eq!(format_date(19_723), "2024-01-01");
    }

    #[test]
    fn test_time_formats() {
        assert_eq!(format_time_millis(0), "00:00:00.000");
        assert_eq!(format_time_millis(3_661_001), "01:01:01.001");
        assert_eq!(format_time_millis(-1), "-00:00:00.001");
        // hours exceed 23 for interval-like values
        assert_eq!(format_time_millis(90_000_000), "25:00:00.000");
        assert_eq!(format_time_micros(1_000_001), "00:00:01.000001");
        assert_eq!(format_time_nanos(1), "00:00:00.000000001");
    }

    #[test]
    fn test_timestamp_formats() {
        assert_eq!(format_timestamp(0, TimeUnit::Millis), "1970-01-01T00:00:00.000");
        assert_eq!(
            format_timestamp(1_500, TimeUnit::Millis),
            "1970-01-01T00:00:01.500"
        );
        assert_eq!(
            format_timestamp(-1, TimeUnit::Micros),
            "1969-12-31T23:59:59.999999"
        );
    }

    #[test]
    fn test_interval_scenarios() {
        assert_eq!(
            format_interval(&[0; 12]),
            "interval(0 months, 0 days, 0 millis)"
        );
        assert_eq!(
            format_interval(&[3, 0, 0, 0, 6, 0, 0, 0, 9, 0, 0, 0]),
            "interval(3 months, 6 days, 9 millis)"
        );
        assert_eq!(
            format_interval(&[
                0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0xFF, 0xFF, 0xFF, 0xFD, 0xFF, 0xFF, 0xFF
            ]),
            "interval(4294967295 months, 4294967294 days, 4294967293 millis)"
        );
        assert_eq!(format_interval(&[1, 2, 3]), "<INVALID>");
    }

    #[test]
    fn test_decimal_exact_scale() {
        assert_eq!(format_decimal_int(12345, 2), "123.45");
        assert_eq!(format_decimal_int(-12345, 2), "-123.45");
        assert_eq!(format_decimal_int(5, 3), "0.005");
        assert_eq!(format_decimal_int(1200, 2), "12.00");
        assert_eq!(format_decimal_int(7, 0), "7");
    }

    #[test]
    fn test_decimal_be_binary() {
        assert_eq!(format_decimal_be(&[0x01, 0x00], 1), "25.6");
        assert_eq!(format_decimal_be(&[0xFF], 0), "-1");
        assert_eq!(format_decimal_be(&[0xFF, 0x00], 2), "-2.56");
        assert_eq!(format_decimal_be(&[0x00], 2), "0.00");
        // wider than i128: 20 bytes of 0xFF is -1
        assert_eq!(format_decimal_be(&[0xFF; 20], 0), "-1");
    }

    #[test]
    fn test_unsigned_never_negative() {
        assert_eq!(format_unsigned_i32(-1, 32), "4294967295");
        assert_eq!(format_unsigned_i32(-1, 8), "255");
        assert_eq!(format_unsigned_i64(-1), "18446744073709551615");
    }
}
