//! Layout Classifier Module
//!
//! ヘッダーキーワードの組み合わせからシートのレイアウトを判定するモジュール。

use tracing::debug;

use crate::api::Layout;
use crate::types::Sheet;

pub(crate) const DEBIT: &str = "дебет";
pub(crate) const CREDIT: &str = "кредит";
pub(crate) const PRIHOD: &str = "приход";
pub(crate) const RASHOD: &str = "расход";
pub(crate) const DT: &str = "дт";
pub(crate) const KT: &str = "кт";

/// 期首・期末残高列を示す部分文字列
pub(crate) const BALANCE_MARKERS: [&str; 2] = ["нач. остаток", "кон. остаток"];

/// セルテキストを比較用に正規化（前後の空白除去・小文字化）
pub(crate) fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}

/// 1行分のヘッダーキーワードの有無
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct HeaderFlags {
    debit: bool,
    credit: bool,
    prihod: bool,
    rashod: bool,
    dt: bool,
    kt: bool,
    balance: bool,
}

impl HeaderFlags {
    /// 行をスキャンしてフラグを設定する
    ///
    /// キーワードはセル全体との一致（大文字小文字を区別しない）、
    /// 残高マーカーは行内の任意のセルへの部分一致で判定します。
    pub(crate) fn scan(row: &[String]) -> Self {
        let mut flags = HeaderFlags::default();
        for cell in row {
            let folded = fold(cell);
            match folded.as_str() {
                DEBIT => flags.debit = true,
                CREDIT => flags.credit = true,
                PRIHOD => flags.prihod = true,
                RASHOD => flags.rashod = true,
                DT => flags.dt = true,
                KT => flags.kt = true,
                _ => {}
            }
            if BALANCE_MARKERS.iter().any(|marker| folded.contains(marker)) {
                flags.balance = true;
            }
        }
        flags
    }

    /// フラグの組み合わせに対応するレイアウト
    ///
    /// 1行に複数の組が揃った場合は Дебет/Кредит、Приход/Расход、Дт/Кт の順で優先します。
    pub(crate) fn layout(&self) -> Option<Layout> {
        if self.debit && self.credit {
            Some(Layout::DebitCredit)
        } else if self.prihod && self.rashod {
            if self.balance {
                Some(Layout::PrihodRashodWithBalance)
            } else {
                Some(Layout::PrihodRashodAsDebitCredit)
            }
        } else if self.dt && self.kt {
            Some(Layout::DtKt)
        } else {
            None
        }
    }
}

/// テキスト化済みの行からレイアウトを判定する
pub(crate) fn classify_rows(rows: &[Vec<String>]) -> Layout {
    for (index, row) in rows.iter().enumerate() {
        if let Some(layout) = HeaderFlags::scan(row).layout() {
            debug!(header_row = index, ?layout, "layout recognized");
            return layout;
        }
    }
    debug!(rows = rows.len(), "no header keyword pair found");
    Layout::Unknown
}

/// シートのレイアウトを判定する
///
/// 上から順に行をスキャンし、既知のキーワードの組が最初に揃った行でレイアウトを決定します。
/// どの行でも組が揃わない場合は`Layout::Unknown`を返します。
///
/// # 使用例
///
/// ```rust
/// use sverka::{classify, Cell, Layout, Sheet};
///
/// let sheet = Sheet::from_rows(vec![
///     vec![Cell::from("Дата"), Cell::from("Дебет"), Cell::from("Кредит")],
///     vec![Cell::from("01.06.2024"), Cell::from(150.0), Cell::empty()],
/// ]);
/// assert_eq!(classify(&sheet), Layout::DebitCredit);
/// ```
pub fn classify(sheet: &Sheet) -> Layout {
    classify_rows(&sheet.text_rows())
}
