//! Comparison Result Module
//!
//! 照合結果（サマリー行と詳細データ）を表す型を定義するモジュール。

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::types::{KeyedTable, Row};

/// 比較対象のファイル（1番目または2番目）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FileSide {
    First,
    Second,
}

impl fmt::Display for FileSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSide::First => write!(f, "1"),
            FileSide::Second => write!(f, "2"),
        }
    }
}

/// サマリーの1行
///
/// `Display`で人が読める文言に変換されます。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryLine {
    /// キー集合の重なりが閾値未満のため比較を中止した
    KeysDiverge {
        /// 共通キーの割合（0.0〜1.0）
        overlap: f64,
    },

    /// ファイルごとのキー数と行数
    RecordCount {
        file: FileSide,
        keys: usize,
        rows: usize,
    },

    /// 共通キーの数
    CommonKeys { count: usize },

    /// 値の多重集合が一致しないキー
    KeyMismatch { key: String },

    /// 一方のファイルにのみ多く出現する値
    ExtraValue {
        file: FileSide,
        value: String,
        count: usize,
    },

    /// 不一致分の合計
    UnmatchedTotal { file: FileSide, sum: f64 },

    /// 両ファイルの不一致合計の差
    Difference { amount: f64 },

    /// 金額が一致しない商品
    Product { name: String },

    /// 商品について見つかった金額
    ProductAmount { amount: String },

    /// 商品の金額の最大値と最小値の差
    ProductSpread { amount: f64 },
}

impl fmt::Display for SummaryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryLine::KeysDiverge { overlap } => write!(
                f,
                "Files have too few keys in common ({:.1}%), comparison skipped",
                overlap * 100.0
            ),
            SummaryLine::RecordCount { file, keys, rows } => {
                write!(f, "File {file}: {keys} keys, {rows} rows")
            }
            SummaryLine::CommonKeys { count } => write!(f, "Common keys: {count}"),
            SummaryLine::KeyMismatch { key } => write!(f, "Mismatch for key {key}"),
            SummaryLine::ExtraValue { file, value, count } => write!(
                f,
                "File {file} has {count} extra occurrence{} of {value}",
                if *count == 1 { "" } else { "s" }
            ),
            SummaryLine::UnmatchedTotal { file, sum } => {
                write!(f, "Unmatched total in file {file}: {sum:.2}")
            }
            SummaryLine::Difference { amount } => write!(f, "Difference: {amount:.2}"),
            SummaryLine::Product { name } => write!(f, "Product: {name}"),
            SummaryLine::ProductAmount { amount } => write!(f, "Amount: {amount}"),
            SummaryLine::ProductSpread { amount } => write!(f, "Spread: {amount:.2}"),
        }
    }
}

/// 不一致キーについて、一方のファイルにのみ存在する行
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MismatchInfo {
    /// ファイル1にのみ（より多く）存在する行
    pub unique_rows_file1: Vec<Row>,
    /// ファイル2にのみ（より多く）存在する行
    pub unique_rows_file2: Vec<Row>,
}

impl MismatchInfo {
    /// 指定したファイル側の固有行
    pub fn unique_rows(&self, file: FileSide) -> &[Row] {
        match file {
            FileSide::First => &self.unique_rows_file1,
            FileSide::Second => &self.unique_rows_file2,
        }
    }
}

/// 商品照合で金額が一致しなかった商品
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDiscrepancy {
    /// 商品名（統合後のキー）
    pub product: String,
    /// 見つかった異なる金額（正規化済み文字列、昇順）
    pub amounts: Vec<String>,
    /// 最大値と最小値の差
    pub spread: f64,
}

/// 照合モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    /// 日付キーによる取引行の照合
    Ledger,
    /// 商品名の近似一致による金額照合
    Products,
}

/// ドリルダウン用の詳細データ
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ComparisonDetail {
    /// 取引行照合の詳細
    Ledger {
        file1: KeyedTable,
        file2: KeyedTable,
        /// 不一致キーごとの固有行
        mismatches: BTreeMap<String, MismatchInfo>,
    },

    /// 商品照合の詳細
    Products {
        /// 金額が一致しない商品のみを含む統合テーブル
        merged: KeyedTable,
        discrepancies: Vec<ProductDiscrepancy>,
    },
}

/// 1回の照合の結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    /// 照合モード
    pub mode: ComparisonMode,
    /// サマリー行（順序は決定的）
    pub summary: Vec<SummaryLine>,
    /// 詳細データ（キー重なりが不足して中止した場合は`None`）
    pub detail: Option<ComparisonDetail>,
}

impl ComparisonResult {
    /// 差異がないかどうか
    pub fn is_identical(&self) -> bool {
        self.summary.is_empty()
    }

    /// キーの重なり不足により比較を中止したかどうか
    pub fn is_aborted(&self) -> bool {
        self.summary
            .iter()
            .any(|line| matches!(line, SummaryLine::KeysDiverge { .. }))
    }

    /// 取引行照合の不一致情報
    pub fn mismatches(&self) -> Option<&BTreeMap<String, MismatchInfo>> {
        match &self.detail {
            Some(ComparisonDetail::Ledger { mismatches, .. }) => Some(mismatches),
            _ => None,
        }
    }

    /// 商品照合の不一致商品
    pub fn discrepancies(&self) -> Option<&[ProductDiscrepancy]> {
        match &self.detail {
            Some(ComparisonDetail::Products { discrepancies, .. }) => Some(discrepancies),
            _ => None,
        }
    }
}
