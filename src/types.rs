//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。
//! ワークブックリーダーが生成するセル・シートと、解析結果のキー付きテーブルを含みます。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// セルの値を表す列挙型
///
/// 数式セルはキャッシュされた計算結果として表現されます。
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 空セル
    Empty,

    /// 文字列
    Text(String),

    /// 数値（f64）
    Number(f64),

    /// 論理値
    Bool(bool),

    /// 日付（日付書式のシリアル値から変換済み）
    Date(NaiveDate),

    /// エラー値（例: #DIV/0!）
    Error(String),
}

/// セル値の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Empty,
    Text,
    Number,
    Bool,
    Date,
    Error,
}

impl CellValue {
    /// 値の種類を取得
    pub fn kind(&self) -> CellKind {
        match self {
            CellValue::Empty => CellKind::Empty,
            CellValue::Text(_) => CellKind::Text,
            CellValue::Number(_) => CellKind::Number,
            CellValue::Bool(_) => CellKind::Bool,
            CellValue::Date(_) => CellKind::Date,
            CellValue::Error(_) => CellKind::Error,
        }
    }

    /// 値が空かどうかを判定
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

/// シート上の1セル
///
/// アクセスごとに生成される一時的な値で、解析結果には保持されません。
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// セルの値
    pub value: CellValue,
}

impl Cell {
    /// 空セルを生成
    pub fn empty() -> Self {
        Self {
            value: CellValue::Empty,
        }
    }

    /// 文字列セルを生成
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            value: CellValue::Text(text.into()),
        }
    }

    /// 数値セルを生成
    pub fn number(value: f64) -> Self {
        Self {
            value: CellValue::Number(value),
        }
    }

    /// 日付セルを生成
    pub fn date(date: NaiveDate) -> Self {
        Self {
            value: CellValue::Date(date),
        }
    }

    /// 論理値セルを生成
    pub fn bool(value: bool) -> Self {
        Self {
            value: CellValue::Bool(value),
        }
    }

    /// 値の種類を取得
    pub fn kind(&self) -> CellKind {
        self.value.kind()
    }

    /// セルの正規化済みテキストを取得
    pub fn text_value(&self) -> String {
        crate::cell_text::cell_text(self)
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        if text.is_empty() {
            Cell::empty()
        } else {
            Cell::text(text)
        }
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::from(text.as_str())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::number(value)
    }
}

impl From<NaiveDate> for Cell {
    fn from(date: NaiveDate) -> Self {
        Cell::date(date)
    }
}

/// ワークシート（セルの行の並び）
///
/// ワークブックリーダーが生成する入力。コアはこの型のみを扱い、
/// ファイルI/Oには関与しません。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    /// シート名
    pub name: String,

    /// 行ごとのセル（上から順）
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// 名前と行からシートを生成
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// 行のみからシートを生成（名前は"Sheet1"）
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        Self::new("Sheet1", rows)
    }

    /// 行数
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 各行を正規化済みテキストの並びとして取得
    pub(crate) fn text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(Cell::text_value).collect())
            .collect()
    }
}

/// データ行（正規化済みテキストの並び）
///
/// 累計や空白などの非データ要素は除去済み。
pub type Row = Vec<String>;

/// キー（日付または正規化済み商品名）から行リストへのマッピング
///
/// キーは辞書順に保持されるため、反復順序は常に決定的です。
/// 各行はちょうど1つのキーに属します。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyedTable {
    entries: BTreeMap<String, Vec<Row>>,
}

impl KeyedTable {
    /// 空のテーブルを生成
    pub fn new() -> Self {
        Self::default()
    }

    /// キーの末尾に行を追加
    pub fn push(&mut self, key: impl Into<String>, row: Row) {
        self.entries.entry(key.into()).or_default().push(row);
    }

    /// キーに対応する行を取得（存在しない場合は空スライス）
    pub fn rows(&self, key: &str) -> &[Row] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// キーが存在するか
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// キーの一覧（辞書順）
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// (キー, 行リスト)の反復子（辞書順）
    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<Row>> {
        self.entries.iter()
    }

    /// キーの数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// テーブルが空か
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 全キーを通じた行数
    pub fn row_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

impl FromIterator<(String, Vec<Row>)> for KeyedTable {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Row>)>>(iter: I) -> Self {
        let mut table = KeyedTable::new();
        for (key, rows) in iter {
            table.entries.entry(key).or_default().extend(rows);
        }
        table
    }
}

impl<'a> IntoIterator for &'a KeyedTable {
    type Item = (&'a String, &'a Vec<Row>);
    type IntoIter = btree_map::Iter<'a, String, Vec<Row>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
