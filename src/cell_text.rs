//! Cell Text Module
//!
//! 1つのセル（文字列・数値・論理値・数式・日付）を正規化済みの文字列表現に変換するモジュール。

use chrono::{Duration, NaiveDate};

use crate::types::{Cell, CellValue};

/// 日付キーの書式（`dd.mm.yyyy`）
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// セルを正規化済みテキストに変換する
///
/// - 文字列: 前後の空白を除去
/// - 数値: 整数値は小数部なし（`1`）、それ以外は最短表現（`42.5`）
/// - 論理値: `true` / `false`
/// - 日付: `dd.mm.yyyy`
/// - エラー値・空セル: 空文字列
pub fn cell_text(cell: &Cell) -> String {
    match &cell.value {
        CellValue::Text(text) => text.trim().to_string(),
        CellValue::Number(value) => format_number(*value),
        CellValue::Bool(value) => value.to_string(),
        CellValue::Date(date) => date.format(DATE_FORMAT).to_string(),
        CellValue::Error(_) | CellValue::Empty => String::new(),
    }
}

/// 数値セルを文字列に変換
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Excelのシリアル日付値を日付に変換する（1900年エポック）
///
/// # エポックシステム
///
/// - 1899年12月30日起算
/// - Excelの1900年うるう年バグにより、シリアル値60（1900-02-29）は存在しない日付。
///   シリアル値1〜59は1日ずらして補正します。
///
/// # 戻り値
///
/// 範囲外の値（負数、オーバーフロー）の場合は`None`
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }

    let days = serial.floor() as i64;
    let epoch = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };

    epoch.checked_add_signed(Duration::days(days))
}
