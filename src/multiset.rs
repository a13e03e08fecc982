//! Value Multiset Module
//!
//! 1つのキーに属する行の値を出現回数付きで保持する多重集合。

use std::collections::BTreeMap;

use serde::Serialize;

use crate::numeric::NumberFormat;
use crate::types::Row;

/// 正規化済み数値文字列から出現回数へのマッピング
///
/// 数値かつ非ゼロのトークンのみを含みます。ゼロや数値でないトークンは
/// 行には表示用に残りますが、比較の対象にはなりません。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValueMultiset {
    counts: BTreeMap<String, usize>,
}

impl ValueMultiset {
    /// 空の多重集合を生成
    pub fn new() -> Self {
        Self::default()
    }

    /// 行リストから多重集合を構築する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use sverka::{NumberFormat, ValueMultiset};
    ///
    /// let rows = vec![
    ///     vec!["Оплата".to_string(), "150".to_string()],
    ///     vec!["150,00".to_string(), "0".to_string()],
    /// ];
    /// let multiset = ValueMultiset::from_rows(&rows, &NumberFormat::default());
    /// assert_eq!(multiset.count("150.00"), 2);
    /// assert_eq!(multiset.len(), 1);
    /// ```
    pub fn from_rows(rows: &[Row], format: &NumberFormat) -> Self {
        let mut multiset = Self::new();
        for token in rows.iter().flatten() {
            if let Some(value) = format.comparable(token) {
                multiset.insert(value);
            }
        }
        multiset
    }

    /// 正規化済みの値を1つ追加
    pub fn insert(&mut self, value: impl Into<String>) {
        *self.counts.entry(value.into()).or_insert(0) += 1;
    }

    /// 値の出現回数
    pub fn count(&self, value: &str) -> usize {
        self.counts.get(value).copied().unwrap_or(0)
    }

    /// (値, 出現回数)の反復子（値の辞書順）
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(value, count)| (value.as_str(), *count))
    }

    /// 異なる値の数
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// 2つの多重集合が一致するか
    ///
    /// どちらか一方に含まれるすべての値について、出現回数が等しい場合に一致します。
    pub fn matches(&self, other: &ValueMultiset) -> bool {
        self.counts
            .keys()
            .chain(other.counts.keys())
            .all(|value| self.count(value) == other.count(value))
    }

    /// `other`より多く出現する値と、その超過回数（値の辞書順）
    pub fn excess_over(&self, other: &ValueMultiset) -> Vec<(String, usize)> {
        self.counts
            .iter()
            .filter_map(|(value, &count)| {
                let theirs = other.count(value);
                (count > theirs).then(|| (value.clone(), count - theirs))
            })
            .collect()
    }
}

impl FromIterator<String> for ValueMultiset {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut multiset = Self::new();
        for value in iter {
            multiset.insert(value);
        }
        multiset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn multiset(values: &[&str]) -> ValueMultiset {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_from_rows_skips_zero_and_text() {
        let rows = vec![
            vec!["Оплата".to_string(), "150".to_string(), "0".to_string()],
            vec!["0,0000001".to_string(), "-20,5".to_string()],
            vec!["0.004".to_string(), "-0,003".to_string()],
        ];
        let multiset = ValueMultiset::from_rows(&rows, &NumberFormat::default());
        assert_eq!(multiset.count("150.00"), 1);
        assert_eq!(multiset.count("-20.50"), 1);
        assert_eq!(multiset.count("0.00"), 0);
        assert_eq!(multiset.len(), 2);
    }

    #[test]
    fn test_matches() {
        assert!(multiset(&["1", "2", "2"]).matches(&multiset(&["2", "1", "2"])));
        assert!(!multiset(&["1", "2"]).matches(&multiset(&["1", "2", "2"])));
        assert!(!multiset(&["1"]).matches(&multiset(&["3"])));
        assert!(ValueMultiset::new().matches(&ValueMultiset::new()));
    }

    #[test]
    fn test_excess_over() {
        let first = multiset(&["150.00"]);
        let second = multiset(&["150.00", "150.00", "20.00"]);
        assert!(first.excess_over(&second).is_empty());
        assert_eq!(
            second.excess_over(&first),
            vec![("150.00".to_string(), 1), ("20.00".to_string(), 1)]
        );
    }

    proptest! {
        #[test]
        fn prop_matches_is_symmetric(
            a in proptest::collection::vec("[1-5]", 0..8),
            b in proptest::collection::vec("[1-5]", 0..8),
        ) {
            let a: ValueMultiset = a.into_iter().collect();
            let b: ValueMultiset = b.into_iter().collect();
            prop_assert_eq!(a.matches(&b), b.matches(&a));
            prop_assert_eq!(a.matches(&b), a == b);
        }
    }
}
