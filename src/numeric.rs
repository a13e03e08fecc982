//! Numeric Module
//!
//! 数値判定・ロケール非依存の数値解析と、正規化に使用する数値フォーマットを提供するモジュール。
//! プロセス全体のロケールには依存せず、`NumberFormat`を明示的に受け渡します。

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SverkaError;

/// ゼロとみなす絶対値の閾値
pub const ZERO_EPSILON: f64 = 1e-6;

/// 数値文字列を解析する（ロケール非依存）
///
/// 空白・ノーブレークスペース・アポストロフィ（桁区切り）を除去し、
/// `,`と`.`が両方含まれる場合は後ろにある方を小数点として扱います。
/// `,`のみの場合は小数点とみなします。
///
/// # 戻り値
///
/// * `Ok(f64)` - 有限の数値
/// * `Err(SverkaError::MalformedNumber)` - 数値として解釈できない場合
///
/// # 使用例
///
/// ```rust
/// use sverka::parse_decimal;
///
/// assert_eq!(parse_decimal("1 234,56").unwrap(), 1234.56);
/// assert_eq!(parse_decimal("1,234.56").unwrap(), 1234.56);
/// assert!(parse_decimal("01.06.2024").is_err());
/// ```
pub fn parse_decimal(text: &str) -> Result<f64, SverkaError> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{00A0}' | '\u{202F}' | '\''))
        .collect();

    if cleaned.is_empty() {
        return Err(SverkaError::MalformedNumber(text.to_string()));
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    // "inf"や"NaN"のような表記は金額として扱わない
    if !normalized
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
    {
        return Err(SverkaError::MalformedNumber(text.to_string()));
    }

    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(SverkaError::MalformedNumber(text.to_string())),
    }
}

/// 数値として解析できない値を0として回復する
///
/// 数値であるべきセルが不正な場合でも比較全体を中断しないためのヘルパー。
pub(crate) fn decimal_or_zero(text: &str) -> f64 {
    match parse_decimal(text) {
        Ok(value) => value,
        Err(err) => {
            warn!(value = text, error = %err, "treating malformed numeric value as zero");
            0.0
        }
    }
}

/// 文字列が数値かどうか
pub fn is_numeric(text: &str) -> bool {
    parse_decimal(text).is_ok()
}

/// 数値がゼロとみなせるか
pub fn is_zero(value: f64) -> bool {
    value.abs() < ZERO_EPSILON
}

/// 文字列が数値で、かつゼロでないか
pub fn is_non_zero(text: &str) -> bool {
    matches!(parse_decimal(text), Ok(value) if !is_zero(value))
}

/// 文字列が行番号（符号なしの正の整数）かどうか
pub fn is_sequence_number(text: &str) -> bool {
    !text.is_empty()
        && text.chars().all(|c| c.is_ascii_digit())
        && text.parse::<u64>().map(|n| n > 0).unwrap_or(false)
}

/// 数値の正規化・出力に使用するフォーマット
///
/// 多重集合のキーとなる正規化済み数値文字列はこのフォーマットで生成されます。
/// 例: `150`、`150,00`、`150.0`はいずれも`150.00`になります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    /// 小数点以下の桁数
    pub decimals: usize,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self { decimals: 2 }
    }
}

impl NumberFormat {
    /// 桁数を指定してフォーマットを生成
    pub fn new(decimals: usize) -> Self {
        Self { decimals }
    }

    /// 数値を文字列に変換（小数点は常に`.`）
    pub fn format(&self, value: f64) -> String {
        let formatted = format!("{:.*}", self.decimals, value);
        // 丸めの結果が"-0.00"になる場合は符号を落とす
        if formatted.starts_with('-') && formatted[1..].chars().all(|c| c == '0' || c == '.') {
            formatted[1..].to_string()
        } else {
            formatted
        }
    }

    /// 数値を指定桁数に丸める
    pub fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.decimals as i32);
        (value * factor).round() / factor
    }

    /// 数値トークンを正規化済み文字列に変換する
    ///
    /// 数値でない場合は`None`。
    pub fn canonical(&self, token: &str) -> Option<String> {
        parse_decimal(token).ok().map(|value| self.format(value))
    }

    /// 比較対象となる（数値かつ非ゼロの）トークンを正規化する
    ///
    /// 丸めた結果がゼロになる値も比較対象外です。
    pub fn comparable(&self, token: &str) -> Option<String> {
        let value = self.round(parse_decimal(token).ok()?);
        if is_zero(value) {
            None
        } else {
            Some(self.format(value))
        }
    }
}
