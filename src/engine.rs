//! Reconciliation Engine Module
//!
//! 2つのキー付きテーブルを、キーごとの値の多重集合として比較するモジュール。

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SverkaError;
use crate::multiset::ValueMultiset;
use crate::numeric::{decimal_or_zero, is_zero, NumberFormat};
use crate::result::{
    ComparisonDetail, ComparisonMode, ComparisonResult, FileSide, MismatchInfo, SummaryLine,
};
use crate::types::{KeyedTable, Row};

/// 比較オプション
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// 不一致合計を絶対値で集計する
    pub compare_by_absolute_value: bool,
    /// キー単位の比較を行うために必要な共通キーの割合（0.0〜1.0）
    pub min_key_overlap: f64,
    /// 値の正規化に使用する数値フォーマット
    pub number_format: NumberFormat,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            compare_by_absolute_value: false,
            min_key_overlap: 0.2,
            number_format: NumberFormat::default(),
        }
    }
}

/// キー集合の重なりの割合
///
/// `|共通キー| / max(|キー1|, |キー2|)`。両方が空の場合は0。
pub fn key_overlap(table1: &KeyedTable, table2: &KeyedTable) -> f64 {
    let larger = table1.len().max(table2.len());
    if larger == 0 {
        return 0.0;
    }
    common_key_count(table1, table2) as f64 / larger as f64
}

fn common_key_count(table1: &KeyedTable, table2: &KeyedTable) -> usize {
    table1.keys().filter(|key| table2.contains_key(key)).count()
}

/// 2つのテーブルを比較する
///
/// 共通キーの割合が`min_key_overlap`未満の場合は、キー数・行数・共通キー数のみを
/// 報告し、詳細データなしで中止します。
///
/// # 使用例
///
/// ```rust
/// use sverka::{compare, CompareOptions, KeyedTable};
///
/// let mut first = KeyedTable::new();
/// first.push("01.06.2024", vec!["150.00".to_string()]);
/// let mut second = KeyedTable::new();
/// second.push("01.06.2024", vec!["150.00".to_string(), "150.00".to_string()]);
///
/// let result = compare(&first, &second, &CompareOptions::default());
/// assert!(!result.is_identical());
/// assert_eq!(result.summary[0].to_string(), "Mismatch for key 01.06.2024");
/// ```
pub fn compare(
    table1: &KeyedTable,
    table2: &KeyedTable,
    options: &CompareOptions,
) -> ComparisonResult {
    let overlap = key_overlap(table1, table2);
    if overlap < options.min_key_overlap {
        info!(
            overlap,
            keys1 = table1.len(),
            keys2 = table2.len(),
            "key sets diverge, comparison skipped"
        );
        return ComparisonResult {
            mode: ComparisonMode::Ledger,
            summary: vec![
                SummaryLine::KeysDiverge { overlap },
                SummaryLine::RecordCount {
                    file: FileSide::First,
                    keys: table1.len(),
                    rows: table1.row_count(),
                },
                SummaryLine::RecordCount {
                    file: FileSide::Second,
                    keys: table2.len(),
                    rows: table2.row_count(),
                },
                SummaryLine::CommonKeys {
                    count: common_key_count(table1, table2),
                },
            ],
            detail: None,
        };
    }

    let format = &options.number_format;
    let keys: BTreeSet<&str> = table1.keys().chain(table2.keys()).collect();

    let mut summary = Vec::new();
    let mut mismatches = BTreeMap::new();

    for key in keys {
        let rows1 = table1.rows(key);
        let rows2 = table2.rows(key);
        let multiset1 = ValueMultiset::from_rows(rows1, format);
        let multiset2 = ValueMultiset::from_rows(rows2, format);

        if multiset1.matches(&multiset2) {
            continue;
        }
        debug!(key, "value multisets differ");

        let excess1 = multiset1.excess_over(&multiset2);
        let excess2 = multiset2.excess_over(&multiset1);

        summary.push(SummaryLine::KeyMismatch {
            key: key.to_string(),
        });
        let sum1 = report_excess(&mut summary, FileSide::First, &excess1, options);
        let sum2 = report_excess(&mut summary, FileSide::Second, &excess2, options);

        let mut difference = (sum1 - sum2).abs();
        if is_zero(difference) {
            difference = 0.0;
        }
        summary.push(SummaryLine::UnmatchedTotal {
            file: FileSide::First,
            sum: sum1,
        });
        summary.push(SummaryLine::UnmatchedTotal {
            file: FileSide::Second,
            sum: sum2,
        });
        summary.push(SummaryLine::Difference { amount: difference });

        mismatches.insert(
            key.to_string(),
            MismatchInfo {
                unique_rows_file1: claim_rows(rows1, &excess1, format),
                unique_rows_file2: claim_rows(rows2, &excess2, format),
            },
        );
    }

    info!(
        keys1 = table1.len(),
        keys2 = table2.len(),
        mismatched = mismatches.len(),
        "ledger comparison finished"
    );

    ComparisonResult {
        mode: ComparisonMode::Ledger,
        summary,
        detail: Some(ComparisonDetail::Ledger {
            file1: table1.clone(),
            file2: table2.clone(),
            mismatches,
        }),
    }
}

/// 超過値をサマリーに追加し、その合計（値 × 超過回数）を返す
fn report_excess(
    summary: &mut Vec<SummaryLine>,
    file: FileSide,
    excess: &[(String, usize)],
    options: &CompareOptions,
) -> f64 {
    let mut sum = 0.0;
    for (value, count) in excess {
        summary.push(SummaryLine::ExtraValue {
            file,
            value: value.clone(),
            count: *count,
        });
        let mut amount = decimal_or_zero(value);
        if options.compare_by_absolute_value {
            amount = amount.abs();
        }
        sum += amount * *count as f64;
    }
    sum
}

/// 超過値の原因となる行を貪欲に割り当てる
///
/// 元の行順に走査し、まだ超過が残っている値を含む行を固有行とみなします。
/// 割り当てた行に含まれる超過値は、その都度作業用の残数から差し引きます。
fn claim_rows(rows: &[Row], excess: &[(String, usize)], format: &NumberFormat) -> Vec<Row> {
    let mut remaining: BTreeMap<&str, usize> = excess
        .iter()
        .map(|(value, count)| (value.as_str(), *count))
        .collect();
    let mut claimed = Vec::new();

    for row in rows {
        if remaining.values().all(|count| *count == 0) {
            break;
        }

        let values: Vec<String> = row.iter().filter_map(|token| format.comparable(token)).collect();
        let mut claims = false;
        for value in &values {
            if let Some(count) = remaining.get_mut(value.as_str()) {
                if *count > 0 {
                    *count -= 1;
                    claims = true;
                }
            }
        }
        if claims {
            claimed.push(row.clone());
        }
    }

    claimed
}

/// テーブルのリストを比較する
///
/// 2つ未満の場合は`SverkaError::InsufficientInput`。3つ以上の場合は先頭の2つを比較します。
pub fn compare_tables(
    tables: &[KeyedTable],
    options: &CompareOptions,
) -> Result<ComparisonResult, SverkaError> {
    match tables {
        [first, second, ..] => Ok(compare(first, second, options)),
        _ => Err(SverkaError::InsufficientInput { got: tables.len() }),
    }
}
