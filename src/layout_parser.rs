//! Layout Parser Module
//!
//! 判定済みレイアウトに従ってシートからキー付きテーブルを抽出するモジュール。
//!
//! 4つのレイアウトはヘッダーキーワードと除外列のみが異なるため、
//! `LayoutRules`でパラメータ化した単一のルーチンで処理します。

use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::api::Layout;
use crate::cell_text::DATE_FORMAT;
use crate::layout::{
    classify_rows, fold, BALANCE_MARKERS, CREDIT, DEBIT, DT, KT, PRIHOD, RASHOD,
};
use crate::numeric::{is_numeric, is_sequence_number, is_zero, parse_decimal};
use crate::types::{KeyedTable, Row, Sheet};

/// 無条件に解析を終了させる語（部分一致）
pub(crate) const STOP_WORDS: [&str; 5] = ["итого", "всего", "всього", "оборот", "разом"];

const SALDO: &str = "сальдо";

/// 「сальдо」と組み合わさった場合のみ解析を終了させる語
const CLOSING_WORDS: [&str; 3] = ["конец", "кінцеве", "кінець"];

fn date_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{2})\.(\d{2})\.(\d{4}|\d{2})$").expect("invalid date token regex")
    })
}

fn saldo_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)сальдо\s+на\s+(\d{2})\.(\d{2})\.(\d{4}|\d{2})\b")
            .expect("invalid saldo date regex")
    })
}

fn embedded_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{2})\.(\d{2})\.(\d{4}|\d{2})\b").expect("invalid embedded date regex")
    })
}

/// 正規表現の捕捉結果（日・月・年）から`dd.mm.yyyy`形式のキーを生成
///
/// 2桁の年は`20yy`に展開します。存在しない日付は`None`。
fn date_key(captures: &Captures<'_>) -> Option<String> {
    let day: u32 = captures.get(1)?.as_str().parse().ok()?;
    let month: u32 = captures.get(2)?.as_str().parse().ok()?;
    let year_text = captures.get(3)?.as_str();
    let mut year: i32 = year_text.parse().ok()?;
    if year_text.len() == 2 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day).map(|date| date.format(DATE_FORMAT).to_string())
}

/// トークン全体が日付であればキーを返す
pub(crate) fn parse_date_token(token: &str) -> Option<String> {
    date_token_re()
        .captures(token.trim())
        .and_then(|captures| date_key(&captures))
}

/// レイアウトごとの解析パラメータ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LayoutRules {
    /// ヘッダー行で探す金額列のキーワード（小文字）
    pub header: [&'static str; 2],
    /// 期首・期末残高列を行データから除外するか
    pub exclude_balance_columns: bool,
    /// ゼロの数値トークンを行データから除外するか
    pub drop_zero_values: bool,
}

impl LayoutRules {
    /// レイアウトに対応するルール（`Unknown`は`None`）
    pub(crate) fn for_layout(layout: Layout) -> Option<Self> {
        let rules = match layout {
            Layout::DebitCredit => LayoutRules {
                header: [DEBIT, CREDIT],
                exclude_balance_columns: false,
                drop_zero_values: false,
            },
            Layout::PrihodRashodWithBalance => LayoutRules {
                header: [PRIHOD, RASHOD],
                exclude_balance_columns: true,
                drop_zero_values: false,
            },
            Layout::PrihodRashodAsDebitCredit => LayoutRules {
                header: [PRIHOD, RASHOD],
                exclude_balance_columns: false,
                drop_zero_values: false,
            },
            Layout::DtKt => LayoutRules {
                header: [DT, KT],
                exclude_balance_columns: false,
                drop_zero_values: true,
            },
            Layout::Unknown => return None,
        };
        Some(rules)
    }
}

/// ヘッダー行の位置と列の役割
#[derive(Debug, Default, PartialEq, Eq)]
struct HeaderInfo {
    row: usize,
    amount_columns: BTreeSet<usize>,
    excluded_columns: BTreeSet<usize>,
}

/// ルールのキーワードが揃う最初の行を探す
fn locate_header(rows: &[Vec<String>], rules: &LayoutRules) -> Option<HeaderInfo> {
    rows.iter().enumerate().find_map(|(index, row)| {
        let folded: Vec<String> = row.iter().map(|cell| fold(cell)).collect();
        let has_all = rules
            .header
            .iter()
            .all(|keyword| folded.iter().any(|cell| cell == keyword));
        if !has_all {
            return None;
        }

        let mut info = HeaderInfo {
            row: index,
            ..HeaderInfo::default()
        };
        for (column, cell) in folded.iter().enumerate() {
            if rules.header.contains(&cell.as_str()) {
                info.amount_columns.insert(column);
            }
            if rules.exclude_balance_columns
                && BALANCE_MARKERS.iter().any(|marker| cell.contains(marker))
            {
                info.excluded_columns.insert(column);
            }
        }
        Some(info)
    })
}

/// 行が解析の終端かどうか
///
/// 構造的に空の行、停止語を含む行、「сальдо」と終了語を同時に含む行が終端です。
/// 「сальдо на <日付>」のような期首残高の行は終端になりません。
pub(crate) fn is_terminator(row: &[String]) -> bool {
    if row.iter().all(|cell| cell.trim().is_empty()) {
        return true;
    }

    let text = fold(&row.join(" "));
    if STOP_WORDS.iter().any(|word| text.contains(word)) {
        return true;
    }

    text.contains(SALDO) && CLOSING_WORDS.iter().any(|word| text.contains(word))
}

/// 行から取り出したトークン（列番号付き）
struct Token {
    column: usize,
    text: String,
}

/// トークン列からキーを探し、キーと残りの値を返す
///
/// 1. トークン全体が日付であるもの（トークンは値から除去）
/// 2. 「сальдо на <日付>」を含むもの（トークンは値から除去）
/// 3. テキスト中に日付を含むもの（トークンは値に残す）
fn extract_key(mut tokens: Vec<Token>) -> Option<(String, Vec<Token>)> {
    if let Some((index, key)) = tokens
        .iter()
        .enumerate()
        .find_map(|(index, token)| parse_date_token(&token.text).map(|key| (index, key)))
    {
        tokens.remove(index);
        return Some((key, tokens));
    }

    if let Some((index, key)) = tokens.iter().enumerate().find_map(|(index, token)| {
        saldo_date_re()
            .captures(&token.text)
            .and_then(|captures| date_key(&captures))
            .map(|key| (index, key))
    }) {
        tokens.remove(index);
        return Some((key, tokens));
    }

    let key = tokens.iter().find_map(|token| {
        embedded_date_re()
            .captures_iter(&token.text)
            .find_map(|captures| date_key(&captures))
    })?;
    Some((key, tokens))
}

/// テキスト化済みの行を指定ルールで解析する
pub(crate) fn parse_rows(rows: &[Vec<String>], rules: &LayoutRules) -> KeyedTable {
    let mut table = KeyedTable::new();

    let header = match locate_header(rows, rules) {
        Some(header) => header,
        None => {
            debug!(header = ?rules.header, "header row not found");
            return table;
        }
    };

    for (index, row) in rows.iter().enumerate().skip(header.row + 1) {
        if is_terminator(row) {
            debug!(row = index, "terminator row reached");
            break;
        }

        let mut tokens: Vec<Token> = row
            .iter()
            .enumerate()
            .filter(|(column, text)| {
                !text.trim().is_empty() && !header.excluded_columns.contains(column)
            })
            .map(|(column, text)| Token {
                column,
                text: text.trim().to_string(),
            })
            .collect();

        if rules.drop_zero_values {
            tokens.retain(|token| !matches!(parse_decimal(&token.text), Ok(value) if is_zero(value)));
        }

        if tokens
            .first()
            .map(|token| is_sequence_number(&token.text))
            .unwrap_or(false)
        {
            tokens.remove(0);
        }

        let Some((key, tokens)) = extract_key(tokens) else {
            debug!(row = index, "row without date key dropped");
            continue;
        };

        let values: Row = tokens
            .into_iter()
            .filter(|token| {
                if header.amount_columns.contains(&token.column) && !is_numeric(&token.text) {
                    warn!(row = index, value = %token.text, "malformed amount dropped");
                    return false;
                }
                true
            })
            .map(|token| token.text)
            .collect();

        if values.is_empty() {
            continue;
        }

        table.push(key, values);
    }

    table
}

/// 指定レイアウトでシートを解析する
///
/// `Layout::Unknown`の場合は空のテーブルを返します。
pub fn parse_layout(sheet: &Sheet, layout: Layout) -> KeyedTable {
    match LayoutRules::for_layout(layout) {
        Some(rules) => parse_rows(&sheet.text_rows(), &rules),
        None => KeyedTable::new(),
    }
}

/// レイアウト判定と解析の結果
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedSheet {
    /// 既知のレイアウトで解析したテーブル
    Table {
        /// 判定されたレイアウト
        layout: Layout,
        /// 抽出したテーブル
        table: KeyedTable,
    },

    /// 既知のレイアウトに該当しない（商品照合モードへの切り替えシグナル）
    UnknownLayout,
}

/// レイアウトを判定し、対応するパーサーで解析する
///
/// # 使用例
///
/// ```rust
/// use sverka::{classify_and_parse, Cell, Layout, ParsedSheet, Sheet};
///
/// let sheet = Sheet::from_rows(vec![
///     vec![Cell::from("Дата"), Cell::from("Дебет"), Cell::from("Кредит")],
///     vec![Cell::from("01.06.2024"), Cell::from(150.0), Cell::empty()],
///     vec![Cell::from("Итого"), Cell::from(150.0), Cell::empty()],
/// ]);
///
/// match classify_and_parse(&sheet) {
///     ParsedSheet::Table { layout, table } => {
///         assert_eq!(layout, Layout::DebitCredit);
///         assert_eq!(table.rows("01.06.2024"), &[vec!["150".to_string()]]);
///     }
///     ParsedSheet::UnknownLayout => unreachable!(),
/// }
/// ```
pub fn classify_and_parse(sheet: &Sheet) -> ParsedSheet {
    let rows = sheet.text_rows();
    let layout = classify_rows(&rows);
    match LayoutRules::for_layout(layout) {
        Some(rules) => ParsedSheet::Table {
            layout,
            table: parse_rows(&rows, &rules),
        },
        None => ParsedSheet::UnknownLayout,
    }
}
