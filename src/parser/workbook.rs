//! Workbook Parser Module
//!
//! calamineを使用したワークブック読み込みの実装。
//! 選択した1シートを`Sheet`（型付きセルの行）として取り出します。

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use chrono::NaiveDate;
use std::io::{Cursor, Read};
use tracing::debug;

use crate::api::SheetSelector;
use crate::cell_text::excel_serial_to_date;
use crate::error::SverkaError;
use crate::security::InputLimits;
use crate::types::{Cell, CellValue, Sheet};

/// ZIPコンテナ（XLSX/XLSM/XLSB/ODS）のシグネチャ
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// OLE2複合ドキュメント（XLS）のシグネチャ
const OLE2_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// 先頭バイトから判定したファイル形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// ZIPベースの形式（Office Open XMLなど）
    Ooxml,
    /// OLE2複合ドキュメント（旧形式のXLSなど）
    Ole2,
    /// 不明
    Unknown,
}

/// 先頭のマジックバイトからファイル形式を判定する
///
/// # 使用例
///
/// ```rust
/// use sverka::{sniff_file_kind, FileKind};
///
/// assert_eq!(sniff_file_kind(b"PK\x03\x04rest"), FileKind::Ooxml);
/// assert_eq!(sniff_file_kind(b"plain text"), FileKind::Unknown);
/// ```
pub fn sniff_file_kind(bytes: &[u8]) -> FileKind {
    if bytes.starts_with(&ZIP_MAGIC) {
        FileKind::Ooxml
    } else if bytes.starts_with(&OLE2_MAGIC) {
        FileKind::Ole2
    } else {
        FileKind::Unknown
    }
}

/// ワークブックパーサー
///
/// calamineのラッパーとして、入力全体をメモリに読み込んだ上でシートを取り出します。
pub struct WorkbookParser {
    /// calamineのワークブック（形式は自動判定）
    workbook: Sheets<Cursor<Vec<u8>>>,
    /// 入力のファイル形式
    kind: FileKind,
    /// 入力の制限
    limits: InputLimits,
}

impl WorkbookParser {
    /// ワークブックを開く
    ///
    /// # 引数
    ///
    /// * `reader` - ワークブックを読み込むためのリーダー
    /// * `limits` - 入力サイズ・行数の制限
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookParser)` - ワークブックの読み込みに成功した場合
    /// * `Err(SverkaError::SecurityViolation)` - 入力サイズが上限を超える場合
    /// * `Err(SverkaError::LegacyFormat)` - OLE2形式だがcalamineで開けない場合（外部変換が必要）
    /// * `Err(SverkaError::Parse)` - その他の理由で開けない場合
    pub fn open<R: Read>(reader: R, limits: &InputLimits) -> Result<Self, SverkaError> {
        // 上限+1バイトまで読み込み、超過を検出する
        let mut buffer = Vec::new();
        let bytes_read = reader
            .take(limits.max_input_size.saturating_add(1))
            .read_to_end(&mut buffer)?;
        limits.check_input_size(bytes_read as u64)?;

        let kind = sniff_file_kind(&buffer);
        debug!(?kind, bytes = bytes_read, "opening workbook");

        let workbook = match open_workbook_auto_from_rs(Cursor::new(buffer)) {
            Ok(workbook) => workbook,
            Err(err) if kind == FileKind::Ole2 => {
                return Err(SverkaError::LegacyFormat(err.to_string()))
            }
            Err(err) => return Err(SverkaError::Parse(err)),
        };

        Ok(Self {
            workbook,
            kind,
            limits: *limits,
        })
    }

    /// 入力のファイル形式
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// すべてのシート名を取得
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// シート選択方式に基づいてシート名を解決
    ///
    /// # 戻り値
    ///
    /// * `Ok(String)` - 選択されたシート名
    /// * `Err(SverkaError::SheetNotFound)` - シートが見つからない、またはインデックスが範囲外の場合
    fn resolve_sheet_name(&self, selector: &SheetSelector) -> Result<String, SverkaError> {
        let names = self.sheet_names();
        match selector {
            SheetSelector::Index(index) => names.get(*index).cloned().ok_or_else(|| {
                SverkaError::SheetNotFound(format!(
                    "index {} is out of range (total: {})",
                    index,
                    names.len()
                ))
            }),
            SheetSelector::Name(name) => {
                if names.contains(name) {
                    Ok(name.clone())
                } else {
                    Err(SverkaError::SheetNotFound(name.clone()))
                }
            }
        }
    }

    /// シートを読み込み、型付きセルの行に変換する
    ///
    /// 数式セルはキャッシュされた計算結果として取り出されます。
    pub fn read_sheet(&mut self, selector: &SheetSelector) -> Result<Sheet, SverkaError> {
        let name = self.resolve_sheet_name(selector)?;
        let range = self.workbook.worksheet_range(&name)?;
        self.limits.check_rows(range.height())?;

        let rows: Vec<Vec<Cell>> = range
            .rows()
            .map(|row| row.iter().map(convert_cell).collect())
            .collect();
        debug!(sheet = %name, rows = rows.len(), "sheet materialized");

        Ok(Sheet::new(name, rows))
    }
}

/// calamineのセル値を`Cell`に変換
fn convert_cell(data: &Data) -> Cell {
    let value = match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_datetime() => excel_serial_to_date(dt.as_f64())
            .map(CellValue::Date)
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::Empty => CellValue::Empty,
        _ => CellValue::Empty,
    };
    Cell { value }
}
