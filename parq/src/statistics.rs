//! Running min/max plus null and distinct counts, per page and rolled up per
//! column chunk. Comparison is driven by the column's [`SortOrder`]; columns
//! with an undefined order keep counts but never report min/max.

use std::cmp::Ordering;

use parq_core::value::{ByteArray, Int96};
use parq_format::metadata::Statistics as StatisticsThrift;

use crate::schema::descriptor::SortOrder;

/// A value that can participate in min/max statistics.
pub trait StatValue: Clone {
    fn stat_cmp(&self, other: &Self, order: SortOrder) -> Ordering;

    /// NaN never enters min/max.
    fn skip_in_stats(&self) -> bool {
        false
    }

    /// Physical plain form, without any length prefix.
    fn to_stat_bytes(&self) -> Vec<u8>;
}

impl StatValue for bool {
    fn stat_cmp(&self, other: &Self, _order: SortOrder) -> Ordering {
        self.cmp(other)
    }

    fn to_stat_bytes(&self) -> Vec<u8> {
        vec![*self as u8]
    }
}

impl StatValue for i32 {
    fn stat_cmp(&self, other: &Self, order: SortOrder) -> Ordering {
        match order {
            SortOrder::Unsigned => (*self as u32).cmp(&(*other as u32)),
            _ => self.cmp(other),
        }
    }

    fn to_stat_bytes(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }
}

impl StatValue for i64 {
    fn stat_cmp(&self, other: &Self, order: SortOrder) -> Ordering {
        match order {
            SortOrder::Unsigned => (*self as u64).cmp(&(*other as u64)),
            _ => self.cmp(other),
        }
    }

    fn to_stat_bytes(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }
}

impl StatValue for f32 {
    fn stat_cmp(&self, other: &Self, _order: SortOrder) -> Ordering {
        // NaN is filtered before comparison; -0.0 and +0.0 compare equal
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }

    fn skip_in_stats(&self) -> bool {
        self.is_nan()
    }

    fn to_stat_bytes(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }
}

impl StatValue for f64 {
    fn stat_cmp(&self, other: &Self, _order: SortOrder) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }

    fn skip_in_stats(&self) -> bool {
        self.is_nan()
    }

    fn to_stat_bytes(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }
}

impl StatValue for Int96 {
    fn stat_cmp(&self, _other: &Self, _order: SortOrder) -> Ordering {
        // INT96 columns always carry an undefined sort order
        Ordering::Equal
    }

    fn to_stat_bytes(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }
}

impl StatValue for ByteArray {
    fn stat_cmp(&self, other: &Self, order: SortOrder) -> Ordering {
        match order {
            SortOrder::Signed => compare_signed_be(self.as_bytes(), other.as_bytes()),
            _ => self.as_bytes().cmp(other.as_bytes()),
        }
    }

    fn to_stat_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

/// Two's-complement big-endian comparison for DECIMAL binaries of possibly
/// different widths.
fn compare_signed_be(a: &[u8], b: &[u8]) -> Ordering {
    let a_neg = a.first().is_some_and(|&byte| byte & 0x80 != 0);
    let b_neg = b.first().is_some_and(|&byte| byte & 0x80 != 0);
    match (a_neg, b_neg) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    let pad = if a_neg { 0xFF } else { 0x00 };
    let width = a.len().max(b.len());
    for i in 0..width {
        let av = if i + a.len() < width { pad } else { a[i + a.len() - width] };
        let bv = if i + b.len() < width { pad } else { b[i + b.len() - width] };
        match av.cmp(&bv) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

/// Accumulator for one page or one chunk of a typed column.
#[derive(Clone, Debug)]
pub struct ValueStatistics<T> {
    order: SortOrder,
    min: Option<T>,
    max: Option<T>,
    null_count: u64,
    distinct_count: Option<u64>,
}

impl<T: StatValue> ValueStatistics<T> {
    pub fn new(order: SortOrder) -> Self {
        Self {
            order,
            min: None,
            max: None,
            null_count: 0,
            distinct_count: None,
        }
    }

    pub fn update(&mut self, value: &T) {
        if value.skip_in_stats() {
            return;
        }
        match &self.min {
            Some(min) if value.stat_cmp(min, self.order) != Ordering::Less => {}
            _ => self.min = Some(value.clone()),
        }
        match &self.max {
            Some(max) if value.stat_cmp(max, self.order) != Ordering::Greater => {}
            _ => self.max = Some(value.clone()),
        }
    }

    pub fn update_null(&mut self) {
        self.null_count += 1;
    }

    pub fn set_distinct_count(&mut self, count: u64) {
        self.distinct_count = Some(count);
    }

    pub fn null_count(&self) -> u64 {
        self.null_count
    }

    pub fn min(&self) -> Option<&T> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&T> {
        self.max.as_ref()
    }

    /// Folds another accumulator in, for page-to-chunk rollup.
    pub fn merge(&mut self, other: &Self) {
        if let Some(min) = &other.min {
            match &self.min {
                Some(own) if min.stat_cmp(own, self.order) != Ordering::Less => {}
                _ => self.min = Some(min.clone()),
            }
        }
        if let Some(max) = &other.max {
            match &self.max {
                Some(own) if max.stat_cmp(own, self.order) != Ordering::Greater => {}
                _ => self.max = Some(max.clone()),
            }
        }
        self.null_count += other.null_count;
        // distinct counts do not merge additively
        self.distinct_count = None;
    }

    /// Serialized form, or `None` when nothing is reportable. Columns with an
    /// undefined order only report the null count.
    pub fn to_thrift(&self) -> Option<StatisticsThrift> {
        let with_min_max = self.order != SortOrder::Undefined;
        let stats = StatisticsThrift {
            null_count: Some(self.null_count as i64),
            distinct_count: self.distinct_count.map(|c| c as i64),
            max_value: self
                .max
                .as_ref()
                .filter(|_| with_min_max)
                .map(|v| v.to_stat_bytes()),
            min_value: self
                .min
                .as_ref()
                .filter(|_| with_min_max)
                .map(|v| v.to_stat_bytes()),
        };
        Some(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_vs_unsigned_int() {
        let mut signed = ValueStatistics::<i32>::new(SortOrder::Signed);
        let mut unsigned = ValueStatistics::<i32>::new(SortOrder::Unsigned);
        for v in [5, -1, 3] {
            signed.update(&v);
            unsigned.update(&v);
        }
        assert_eq!(signed.min(), Some(&-1));
        assert_eq!(signed.max(), Some(&5));
        // -1 is u32::MAX unsigned
        assert_eq!(unsigned.min(), Some(&3));
        assert_eq!(unsigned.max(), Some(&-1));
    }

    #[test]
    fn test_nan_excluded_and_absent_when_all_nan() {
        let mut stats = ValueStatistics::<f64>::new(SortOrder::Signed);
        stats.update(&f64::NAN);
        assert_eq!(stats.min(), None);
        assert_eq!(stats.max(), None);
        stats.update(&2.5);
        stats.update(&f64::NAN);
        stats.update(&-1.0);
        assert_eq!(stats.min(), Some(&-1.0));
        assert_eq!(stats.max(), Some(&2.5));
    }

    #[test]
    fn test_negative_zero_compares_equal() {
        let mut stats = ValueStatistics::<f64>::new(SortOrder::Signed);
        stats.update(&0.0);
        stats.update(&-0.0);
        // first-seen zero is retained for both ends
        assert_eq!(stats.min().unwrap().to_bits(), 0.0f64.to_bits());
        assert_eq!(stats.max().unwrap().to_bits(), 0.0f64.to_bits());
    }

    #[test]
    fn test_decimal_be_comparison() {
        // -1 (0xFF) < 0 (0x00) < 1 (0x01); widths may differ
        assert_eq!(compare_signed_be(&[0xFF], &[0x00]), Ordering::Less);
        assert_eq!(compare_signed_be(&[0x01], &[0x00]), Ordering::Greater);
        assert_eq!(compare_signed_be(&[0xFF, 0xFF], &[0xFF]), Ordering::Equal);
        // -256 = 0xFF00 vs -1 = 0xFF
        assert_eq!(compare_signed_be(&[0xFF, 0x00], &[0xFF]), Ordering::Less);
        // 256 = 0x0100 vs 1 = 0x01
        assert_eq!(compare_signed_be(&[0x01, 0x00], &[0x01]), Ordering::Greater);
    }

    #[test]
    fn test_merge_rolls_up() {
        let mut a = ValueStatistics::<i64>::new(SortOrder::Signed);
        a.update(&10);
        a.update_null();
        let mut b = ValueStatistics::<i64>::new(SortOrder::Signed);
        b.update(&-10);
        b.update_null();
        a.merge(&b);
        assert_eq!(a.min(), Some(&-10));
        assert_eq!(a.max(), Some(&10));
        assert_eq!(a.null_count(), 2);
    }

    #[test]
    fn test_undefined_order_drops_min_max() {
        let mut stats = ValueStatistics::<Int96>::new(SortOrder::Undefined);
        stats.update(&Int96::from_parts(1, 2, 3));
        stats.update_null();
        let thrift = stats.to_thrift().unwrap();
        assert_eq!(thrift.null_count, Some(1));
        assert!(thrift.min_value.is_none());
        assert!(thrift.max_value.is_none());
    }
}
