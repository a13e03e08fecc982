//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use serde::{Deserialize, Serialize};

/// シートのレイアウト
///
/// ヘッダー行のキーワードの組み合わせから判定される、取引行の表現形式。
/// `Unknown`はエラーではなく、照合全体を商品照合モードに切り替えるシグナルです。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Layout {
    /// 「Дебет」/「Кредит」列を持つ照合書
    ///
    /// # 入力例
    ///
    /// ```text
    /// | Дата       | Документ | Дебет  | Кредит |
    /// | 01.06.2024 | Оплата   | 150.00 |        |
    /// ```
    DebitCredit,

    /// 「Приход」/「Расход」列に加えて期首・期末残高列を持つ形式
    ///
    /// 「нач. остаток」「кон. остаток」列は行データから除外されます。
    PrihodRashodWithBalance,

    /// 残高列のない「Приход」/「Расход」形式（借方・貸方と同様に扱う）
    PrihodRashodAsDebitCredit,

    /// 「Дт」/「Кт」列を持つ形式
    ///
    /// 埋め草としてのゼロ値は行データから除外されます。
    DtKt,

    /// 既知のレイアウトに該当しない
    Unknown,
}

impl Layout {
    /// 既知のレイアウトかどうか
    pub fn is_known(&self) -> bool {
        !matches!(self, Layout::Unknown)
    }
}

/// シート選択方式
///
/// 照合対象のシートを選択する方法を指定します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SheetSelector {
    /// インデックス指定（0始まり）
    ///
    /// 例: `SheetSelector::Index(0)` は最初のシートを選択
    Index(usize),

    /// シート名指定
    ///
    /// 例: `SheetSelector::Name("Лист1".to_string())`
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

/// 出力フォーマット
///
/// 照合結果をレンダリングする際の出力形式を指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum OutputFormat {
    /// プレーンテキスト（デフォルト）
    ///
    /// サマリー1件につき1行を出力します。
    #[default]
    Text,

    /// Markdown形式
    ///
    /// サマリーを箇条書きで、不一致キーごとの固有行をテーブルで出力します。
    ///
    /// # 出力例
    ///
    /// ```markdown
    /// - Mismatch for key 01.06.2024
    ///
    /// ### 01.06.2024
    ///
    /// | File | Values |
    /// | ---- | ------ |
    /// | 2    | 150.00 |
    /// ```
    Markdown,

    /// JSON形式
    ///
    /// `ComparisonResult`全体をJSONとして出力します。
    Json,
}
