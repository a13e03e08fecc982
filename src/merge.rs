//! Fuzzy Merger Module
//!
//! 商品照合モードで、表記ゆれのある商品名を編集距離で統合し、
//! 金額が一致しない商品のみを残すモジュール。

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SverkaError;
use crate::normalize::{edit_distance, normalize};
use crate::numeric::{decimal_or_zero, NumberFormat};
use crate::result::{
    ComparisonDetail, ComparisonMode, ComparisonResult, ProductDiscrepancy, SummaryLine,
};
use crate::types::{KeyedTable, Row};

/// 商品統合のオプション
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// 同一商品とみなす正規化済み名称の最大編集距離
    pub max_edit_distance: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            max_edit_distance: 2,
        }
    }
}

/// 行リストを重複のない集合にまとめる（順序は最初の出現順）
fn distinct_rows<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Vec<Row> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(*row))
        .cloned()
        .collect()
}

/// 2つの商品テーブルを統合し、金額が一致しない商品のみを返す
///
/// ファイル1の各キーについて、正規化済み名称の編集距離が最小となるファイル2のキーを探します。
/// 距離が`max_edit_distance`以下であれば同一商品とみなし、両方の金額を集合として
/// ファイル2のキーの下に統合します。対応のないキーはそのまま残ります。
/// 最後に、異なる金額が2つ以上ある商品のみに絞り込みます。
///
/// # 使用例
///
/// ```rust
/// use sverka::{merge_products, KeyedTable};
///
/// let mut first = KeyedTable::new();
/// first.push("крем niveacreme 100мл", vec!["42.50".to_string()]);
/// let mut second = KeyedTable::new();
/// second.push("крем niveacreme 100 мл", vec!["45.00".to_string()]);
///
/// let merged = merge_products(&first, &second, 2);
/// assert_eq!(
///     merged.rows("крем niveacreme 100 мл"),
///     &[vec!["42.50".to_string()], vec!["45.00".to_string()]]
/// );
/// ```
pub fn merge_products(
    table1: &KeyedTable,
    table2: &KeyedTable,
    max_edit_distance: usize,
) -> KeyedTable {
    let candidates: Vec<(&str, String)> = table2
        .keys()
        .map(|key| (key, normalize(key)))
        .collect();

    let mut merged: Vec<(String, Vec<Row>)> = Vec::new();
    let mut consumed: BTreeSet<&str> = BTreeSet::new();

    for (key1, rows1) in table1 {
        let normalized = normalize(key1);
        let best = candidates
            .iter()
            .map(|(key2, normalized2)| (*key2, edit_distance(&normalized, normalized2)))
            .min_by_key(|(_, distance)| *distance);

        match best {
            Some((key2, distance)) if distance <= max_edit_distance => {
                debug!(product1 = %key1, product2 = key2, distance, "products matched");
                consumed.insert(key2);
                merged.push((
                    key2.to_string(),
                    distinct_rows(rows1.iter().chain(table2.rows(key2))),
                ));
            }
            _ => merged.push((key1.clone(), distinct_rows(rows1))),
        }
    }

    for (key2, rows2) in table2 {
        if !consumed.contains(key2.as_str()) {
            merged.push((key2.clone(), distinct_rows(rows2)));
        }
    }

    // 同じキーに複数回統合された場合も集合として扱う
    let collected: KeyedTable = merged.into_iter().collect();
    collected
        .iter()
        .map(|(key, rows)| (key.clone(), distinct_rows(rows)))
        .filter(|(_, rows)| rows.len() > 1)
        .collect()
}

/// 商品テーブルのリストを統合する
///
/// テーブル数がちょうど2つでない場合は`SverkaError::AmbiguousMergeInput`。
pub fn merge_product_tables(
    tables: &[KeyedTable],
    options: &MergeOptions,
) -> Result<KeyedTable, SverkaError> {
    match tables {
        [first, second] => Ok(merge_products(first, second, options.max_edit_distance)),
        _ => Err(SverkaError::AmbiguousMergeInput { got: tables.len() }),
    }
}

/// 統合テーブルから商品ごとの不一致情報を作成する
fn collect_discrepancies(merged: &KeyedTable, format: &NumberFormat) -> Vec<ProductDiscrepancy> {
    merged
        .iter()
        .map(|(product, rows)| {
            let mut amounts: Vec<(f64, String)> = rows
                .iter()
                .flatten()
                .map(|amount| (decimal_or_zero(amount), amount.clone()))
                .collect();
            amounts.sort_by(|a, b| a.0.total_cmp(&b.0));
            amounts.dedup_by(|a, b| a.1 == b.1);

            let spread = match (amounts.first(), amounts.last()) {
                (Some(min), Some(max)) => format.round(max.0 - min.0),
                _ => 0.0,
            };

            ProductDiscrepancy {
                product: product.clone(),
                amounts: amounts.into_iter().map(|(_, text)| text).collect(),
                spread,
            }
        })
        .collect()
}

/// 2つの商品テーブルを照合し、結果を作成する
///
/// 金額が一致しない商品ごとに、商品名・各金額・金額差をサマリーに出力します。
pub fn compare_products(
    tables: &[KeyedTable],
    options: &MergeOptions,
    format: &NumberFormat,
) -> Result<ComparisonResult, SverkaError> {
    let merged = merge_product_tables(tables, options)?;
    let discrepancies = collect_discrepancies(&merged, format);

    let mut summary = Vec::new();
    for discrepancy in &discrepancies {
        summary.push(SummaryLine::Product {
            name: discrepancy.product.clone(),
        });
        summary.extend(discrepancy.amounts.iter().map(|amount| SummaryLine::ProductAmount {
            amount: amount.clone(),
        }));
        summary.push(SummaryLine::ProductSpread {
            amount: discrepancy.spread,
        });
    }

    info!(products = discrepancies.len(), "product comparison finished");

    Ok(ComparisonResult {
        mode: ComparisonMode::Products,
        summary,
        detail: Some(ComparisonDetail::Products {
            merged,
            discrepancies,
        }),
    })
}
