//! Output Formatters Implementation
//!
//! 各出力フォーマットの実装を提供するモジュール。

use std::io::Write;

use unicode_width::UnicodeWidthStr;

use crate::error::SverkaError;
use crate::result::{ComparisonDetail, ComparisonResult, FileSide, SummaryLine};

/// 差異がない場合の出力
const NO_DIFFERENCES: &str = "No differences found";

/// 表示幅で揃えるテーブル（内部ヘルパー）
struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(header: &[&str]) -> Self {
        Self {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// 列幅を計算
    ///
    /// 全角文字は表示幅2として計算し、最小幅は3文字です。
    fn column_widths(&self) -> Vec<usize> {
        let mut widths = vec![3; self.header.len()];
        for row in std::iter::once(&self.header).chain(&self.rows) {
            for (col_idx, cell) in row.iter().enumerate().take(widths.len()) {
                widths[col_idx] = widths[col_idx].max(cell.width());
            }
        }
        widths
    }

    fn write_row<W: Write>(
        writer: &mut W,
        row: &[String],
        widths: &[usize],
        separator: &str,
    ) -> Result<(), SverkaError> {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(col_idx, width)| {
                let content = row.get(col_idx).map(String::as_str).unwrap_or("");
                let padding = width.saturating_sub(content.width());
                format!("{}{}", content, " ".repeat(padding))
            })
            .collect();
        writeln!(writer, "{}", cells.join(separator).trim_end())?;
        Ok(())
    }

    /// 空白区切りのプレーンテキストとして出力
    fn render_plain<W: Write>(&self, writer: &mut W) -> Result<(), SverkaError> {
        let widths = self.column_widths();
        Self::write_row(writer, &self.header, &widths, "  ")?;
        for row in &self.rows {
            Self::write_row(writer, row, &widths, "  ")?;
        }
        Ok(())
    }

    /// Markdownテーブルとして出力
    fn render_markdown<W: Write>(&self, writer: &mut W) -> Result<(), SverkaError> {
        let escaped = Table {
            header: escape_markdown_row(&self.header),
            rows: self.rows.iter().map(|row| escape_markdown_row(row)).collect(),
        };
        let widths = escaped.column_widths();
        let separator: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();

        write_markdown_row(writer, &escaped.header, &widths)?;
        write_markdown_row(writer, &separator, &widths)?;
        for row in &escaped.rows {
            write_markdown_row(writer, row, &widths)?;
        }
        Ok(())
    }
}

/// Markdownのセル区切り文字をエスケープ
fn escape_markdown_row(row: &[String]) -> Vec<String> {
    row.iter().map(|cell| cell.replace('|', "\\|")).collect()
}

fn write_markdown_row<W: Write>(
    writer: &mut W,
    row: &[String],
    widths: &[usize],
) -> Result<(), SverkaError> {
    write!(writer, "|")?;
    for (col_idx, width) in widths.iter().enumerate() {
        let content = row.get(col_idx).map(String::as_str).unwrap_or("");
        let padding = width.saturating_sub(content.width());
        write!(writer, " {}{} |", content, " ".repeat(padding))?;
    }
    writeln!(writer)?;
    Ok(())
}

/// 商品照合の結果をテーブルにまとめる
fn product_table(result: &ComparisonResult) -> Option<Table> {
    let discrepancies = result.discrepancies()?;
    let mut table = Table::new(&["Product", "Amounts", "Spread"]);
    for discrepancy in discrepancies {
        table.push(vec![
            discrepancy.product.clone(),
            discrepancy.amounts.join(", "),
            format!("{:.2}", discrepancy.spread),
        ]);
    }
    Some(table)
}

/// プレーンテキスト形式のフォーマッター
pub struct TextFormatter;

impl TextFormatter {
    pub fn render<W: Write>(
        &self,
        result: &ComparisonResult,
        writer: &mut W,
    ) -> Result<(), SverkaError> {
        if result.is_identical() {
            writeln!(writer, "{}", NO_DIFFERENCES)?;
            writer.flush()?;
            return Ok(());
        }

        match product_table(result) {
            Some(table) => table.render_plain(writer)?,
            None => {
                for line in &result.summary {
                    // キーの見出し以外は字下げ
                    let indent = match line {
                        SummaryLine::KeyMismatch { .. } | SummaryLine::KeysDiverge { .. } => "",
                        _ => "  ",
                    };
                    writeln!(writer, "{}{}", indent, line)?;
                }
            }
        }

        writer.flush()?;
        Ok(())
    }
}

/// Markdown形式のフォーマッター
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    pub fn render<W: Write>(
        &self,
        result: &ComparisonResult,
        writer: &mut W,
    ) -> Result<(), SverkaError> {
        writeln!(writer, "# Reconciliation report")?;
        writeln!(writer)?;

        if result.is_identical() {
            writeln!(writer, "{}", NO_DIFFERENCES)?;
            writer.flush()?;
            return Ok(());
        }

        for line in &result.summary {
            writeln!(writer, "- {}", line)?;
        }

        match &result.detail {
            Some(ComparisonDetail::Ledger { mismatches, .. }) => {
                for (key, info) in mismatches {
                    writeln!(writer)?;
                    writeln!(writer, "### {}", key)?;
                    writeln!(writer)?;

                    let mut table = Table::new(&["File", "Values"]);
                    for file in [FileSide::First, FileSide::Second] {
                        for row in info.unique_rows(file) {
                            table.push(vec![file.to_string(), row.join(" / ")]);
                        }
                    }
                    table.render_markdown(writer)?;
                }
            }
            Some(ComparisonDetail::Products { .. }) => {
                if let Some(table) = product_table(result) {
                    writeln!(writer)?;
                    table.render_markdown(writer)?;
                }
            }
            None => {}
        }

        writer.flush()?;
        Ok(())
    }
}

/// JSON形式のフォーマッター
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn render<W: Write>(
        &self,
        result: &ComparisonResult,
        writer: &mut W,
    ) -> Result<(), SverkaError> {
        serde_json::to_writer_pretty(&mut *writer, result)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}
