//! Output Format Module
//!
//! Strategy Patternによる照合結果の出力フォーマットの抽象化を提供するモジュール。

mod formatters;

use crate::error::SverkaError;
use crate::result::ComparisonResult;
use std::io::Write;

pub use formatters::*;

/// 出力フォーマッター（Strategy Pattern）
///
/// 各出力フォーマット（テキスト, Markdown, JSON）をenumとして表現します。
#[derive(Debug, Clone, Copy)]
pub enum OutputFormatter {
    Text,
    Markdown,
    Json,
}

impl OutputFormatter {
    /// 出力フォーマットからフォーマッターを生成
    pub fn from_format(format: crate::api::OutputFormat) -> Self {
        match format {
            crate::api::OutputFormat::Text => OutputFormatter::Text,
            crate::api::OutputFormat::Markdown => OutputFormatter::Markdown,
            crate::api::OutputFormat::Json => OutputFormatter::Json,
        }
    }

    /// 照合結果を指定されたフォーマットで出力する
    ///
    /// # 引数
    ///
    /// * `result` - 出力する照合結果
    /// * `writer` - 出力先のライター
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 出力に成功した場合
    /// * `Err(SverkaError)` - エラーが発生した場合
    pub fn render<W: Write>(
        &self,
        result: &ComparisonResult,
        writer: &mut W,
    ) -> Result<(), SverkaError> {
        match self {
            OutputFormatter::Text => TextFormatter.render(result, writer),
            OutputFormatter::Markdown => MarkdownFormatter.render(result, writer),
            OutputFormatter::Json => JsonFormatter.render(result, writer),
        }
    }
}
