//! Product Table Parser Module
//!
//! 商品照合モードで使用する、商品名と金額のテーブルを抽出するモジュール。

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::fold;
use crate::layout_parser::STOP_WORDS;
use crate::normalize::normalize;
use crate::numeric::{parse_decimal, NumberFormat};
use crate::types::{KeyedTable, Sheet};

/// 商品テーブルのヘッダー名（小文字、セル全体との一致）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductHeaders {
    /// 商品名の列
    pub product: Vec<String>,
    /// 単価の列
    pub price: Vec<String>,
    /// 金額の列
    pub sum: Vec<String>,
}

impl Default for ProductHeaders {
    fn default() -> Self {
        Self {
            product: vec!["товар".to_string()],
            price: vec!["ціна без пдв".to_string(), "цена без ндс".to_string()],
            sum: vec!["сума без пдв".to_string(), "сумма без ндс".to_string()],
        }
    }
}

/// ヘッダー行と各列の位置
struct ProductColumns {
    header_row: usize,
    product: usize,
    sum: usize,
}

fn find_column(row: &[String], names: &[String]) -> Option<usize> {
    row.iter()
        .position(|cell| names.iter().any(|name| fold(cell) == fold(name)))
}

fn locate_columns(rows: &[Vec<String>], headers: &ProductHeaders) -> Option<ProductColumns> {
    rows.iter().enumerate().find_map(|(index, row)| {
        let product = find_column(row, &headers.product)?;
        find_column(row, &headers.price)?;
        let sum = find_column(row, &headers.sum)?;
        Some(ProductColumns {
            header_row: index,
            product,
            sum,
        })
    })
}

/// 既定のヘッダー名と数値フォーマットで商品テーブルを抽出する
///
/// # 使用例
///
/// ```rust
/// use sverka::{parse_product_table, Cell, Sheet};
///
/// let sheet = Sheet::from_rows(vec![
///     vec![Cell::from("Товар"), Cell::from("Ціна без ПДВ"), Cell::from("Сума без ПДВ")],
///     vec![Cell::from("Крем Nivea Creme 100 мл"), Cell::from(42.5), Cell::from(42.5)],
/// ]);
/// let table = parse_product_table(&sheet);
/// assert_eq!(table.rows("крем niveacreme 100мл"), &[vec!["42.50".to_string()]]);
/// ```
pub fn parse_product_table(sheet: &Sheet) -> KeyedTable {
    parse_product_table_with(sheet, &ProductHeaders::default(), &NumberFormat::default())
}

/// ヘッダー名と数値フォーマットを指定して商品テーブルを抽出する
///
/// ヘッダー行の次の行から読み取り、構造的に空の行、合計行、金額が数値でない行のいずれかで終了します。
/// 商品名が空の行は読み飛ばします。金額は丸めた上で正規化済みの商品名の下に格納します。
pub fn parse_product_table_with(
    sheet: &Sheet,
    headers: &ProductHeaders,
    format: &NumberFormat,
) -> KeyedTable {
    let rows = sheet.text_rows();
    let mut table = KeyedTable::new();

    let Some(columns) = locate_columns(&rows, headers) else {
        debug!(sheet = %sheet.name, "product header row not found");
        return table;
    };

    for (index, row) in rows.iter().enumerate().skip(columns.header_row + 1) {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            debug!(row = index, "empty row ends product table");
            break;
        }

        // 合計行の語は商品名の列以外に置かれることもある
        let folded = fold(&row.join(" "));
        if STOP_WORDS.iter().any(|word| folded.contains(word)) {
            debug!(row = index, "footer row ends product table");
            break;
        }

        let name = row.get(columns.product).map(|s| s.trim()).unwrap_or("");
        if name.is_empty() {
            continue;
        }

        let sum_text = row.get(columns.sum).map(|s| s.trim()).unwrap_or("");
        let sum = match parse_decimal(sum_text) {
            Ok(sum) => sum,
            Err(err) => {
                debug!(row = index, error = %err, "unparsable sum ends product table");
                break;
            }
        };

        table.push(normalize(name), vec![format.format(format.round(sum))]);
    }

    table
}
