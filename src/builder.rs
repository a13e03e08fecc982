//! Builder Module
//!
//! Fluent Builder APIを提供し、`Reconciler`インスタンスを段階的に構築する。

use crate::api::{OutputFormat, SheetSelector};
use crate::engine::{compare_tables, CompareOptions};
use crate::error::SverkaError;
use crate::layout_parser::{classify_and_parse, ParsedSheet};
use crate::merge::{compare_products, MergeOptions};
use crate::numeric::NumberFormat;
use crate::parser::WorkbookParser;
use crate::product::{parse_product_table_with, ProductHeaders};
use crate::result::ComparisonResult;
use crate::security::InputLimits;
use crate::types::{KeyedTable, Sheet};
use rayon::prelude::*;
use std::io::{BufWriter, Read, Write};
use tracing::info;

/// 小数点以下の桁数の上限
const MAX_DECIMALS: usize = 6;

/// 照合処理の設定を保持する内部構造体
#[derive(Debug, Clone, Default)]
pub(crate) struct ReconcileConfig {
    /// シート選択方式
    pub sheet_selector: SheetSelector,

    /// 取引行照合のオプション
    pub compare: CompareOptions,

    /// 商品照合のオプション
    pub merge: MergeOptions,

    /// 商品テーブルのヘッダー名
    pub product_headers: ProductHeaders,

    /// 出力フォーマット
    pub output_format: OutputFormat,

    /// 入力の制限
    pub input_limits: InputLimits,
}

/// Fluent Builder APIを提供する構造体
///
/// `Reconciler`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust
/// use sverka::{OutputFormat, ReconcilerBuilder};
///
/// # fn main() -> Result<(), sverka::SverkaError> {
/// let reconciler = ReconcilerBuilder::new()
///     .compare_by_absolute_value(true)
///     .with_min_key_overlap(0.5)
///     .with_output_format(OutputFormat::Markdown)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ReconcilerBuilder {
    /// 内部設定（構築中）
    config: ReconcileConfig,
}

impl Default for ReconcilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconcilerBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - シート選択: 最初のシート
    /// - 符号付きで不一致合計を集計
    /// - 共通キーの最小割合: 0.2
    /// - 商品名の最大編集距離: 2
    /// - 小数点以下の桁数: 2
    /// - 出力フォーマット: プレーンテキスト
    pub fn new() -> Self {
        Self {
            config: ReconcileConfig::default(),
        }
    }

    /// 照合対象のシートを選択する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use sverka::{ReconcilerBuilder, SheetSelector};
    ///
    /// let builder = ReconcilerBuilder::new()
    ///     .with_sheet_selector(SheetSelector::Name("Акт".to_string()));
    /// ```
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// 不一致合計を絶対値で集計するかを指定する
    pub fn compare_by_absolute_value(mut self, enabled: bool) -> Self {
        self.config.compare.compare_by_absolute_value = enabled;
        self
    }

    /// キー単位の比較に必要な共通キーの割合を指定する
    ///
    /// # 制約
    ///
    /// * `0.0..=1.0`の範囲でなければならない
    /// * 制約違反の場合、`build()`時に`SverkaError::Config`を返す
    pub fn with_min_key_overlap(mut self, ratio: f64) -> Self {
        self.config.compare.min_key_overlap = ratio;
        self
    }

    /// 同一商品とみなす最大編集距離を指定する
    pub fn with_max_edit_distance(mut self, distance: usize) -> Self {
        self.config.merge.max_edit_distance = distance;
        self
    }

    /// 値の正規化に使用する小数点以下の桁数を指定する（最大6）
    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.config.compare.number_format = NumberFormat::new(decimals);
        self
    }

    /// 商品テーブルのヘッダー名を指定する
    pub fn with_product_headers(mut self, headers: ProductHeaders) -> Self {
        self.config.product_headers = headers;
        self
    }

    /// 出力フォーマットを指定する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use sverka::{OutputFormat, ReconcilerBuilder};
    ///
    /// let builder = ReconcilerBuilder::new()
    ///     .with_output_format(OutputFormat::Json);
    /// ```
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// 入力サイズ・行数の制限を指定する
    pub fn with_input_limits(mut self, limits: InputLimits) -> Self {
        self.config.input_limits = limits;
        self
    }

    /// 設定を検証し、`Reconciler`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Reconciler)`: 設定が有効な場合
    /// * `Err(SverkaError::Config)`: 設定が無効な場合
    ///
    /// # 発生し得るエラー
    ///
    /// * 共通キーの割合が`0.0..=1.0`の範囲外
    /// * 小数点以下の桁数が上限を超える
    /// * 商品テーブルのヘッダー名が空
    /// * 入力の制限が0
    pub fn build(self) -> Result<Reconciler, SverkaError> {
        // 1. 共通キーの割合の検証
        let overlap = self.config.compare.min_key_overlap;
        if !(0.0..=1.0).contains(&overlap) {
            return Err(SverkaError::Config(format!(
                "Invalid key overlap ratio: {} (expected 0.0..=1.0)",
                overlap
            )));
        }

        // 2. 桁数の検証
        let decimals = self.config.compare.number_format.decimals;
        if decimals > MAX_DECIMALS {
            return Err(SverkaError::Config(format!(
                "Invalid decimals: {} (max: {})",
                decimals, MAX_DECIMALS
            )));
        }

        // 3. 商品ヘッダーの検証
        let headers = &self.config.product_headers;
        if headers.product.is_empty() || headers.price.is_empty() || headers.sum.is_empty() {
            return Err(SverkaError::Config(
                "Product headers must not be empty".to_string(),
            ));
        }

        // 4. 入力制限の検証
        self.config.input_limits.validate()?;

        Ok(Reconciler::new(self.config))
    }
}

/// 照合処理のファサード
///
/// 2つのワークブック（またはシート）を読み込み、レイアウトを判定して照合するための
/// メインエントリーポイントです。
///
/// # 使用例
///
/// ```rust,no_run
/// use sverka::ReconcilerBuilder;
/// use std::fs::File;
///
/// # fn main() -> Result<(), sverka::SverkaError> {
/// let reconciler = ReconcilerBuilder::new().build()?;
/// let inputs = vec![File::open("ours.xlsx")?, File::open("theirs.xlsx")?];
/// let result = reconciler.reconcile(inputs)?;
/// reconciler.render(&result, std::io::stdout())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Reconciler {
    /// 照合設定
    config: ReconcileConfig,
}

impl Reconciler {
    pub(crate) fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    /// 取引行照合のオプション
    pub fn compare_options(&self) -> &CompareOptions {
        &self.config.compare
    }

    /// 商品照合のオプション
    pub fn merge_options(&self) -> &MergeOptions {
        &self.config.merge
    }

    /// シートを照合する
    ///
    /// # 処理フロー
    ///
    /// 1. 各シートのレイアウトを判定し、対応するパーサーで解析
    /// 2. いずれかのシートが`Layout::Unknown`の場合、全シートを商品テーブルとして解析し直し、
    ///    商品照合を行う（ちょうど2シートが必要）
    /// 3. それ以外の場合、先頭の2つのテーブルを照合
    ///
    /// # 戻り値
    ///
    /// * `Ok(ComparisonResult)` - 照合結果
    /// * `Err(SverkaError::InsufficientInput)` - シートが2つ未満の場合
    /// * `Err(SverkaError::AmbiguousMergeInput)` - 商品照合でシートが2つでない場合
    pub fn reconcile_sheets(&self, sheets: &[Sheet]) -> Result<ComparisonResult, SverkaError> {
        if sheets.len() < 2 {
            return Err(SverkaError::InsufficientInput { got: sheets.len() });
        }

        let parsed: Vec<ParsedSheet> = sheets.iter().map(classify_and_parse).collect();
        let tables: Option<Vec<KeyedTable>> = parsed
            .into_iter()
            .map(|parsed| match parsed {
                ParsedSheet::Table { table, .. } => Some(table),
                ParsedSheet::UnknownLayout => None,
            })
            .collect();

        match tables {
            Some(tables) => {
                info!(sheets = sheets.len(), "reconciling ledger layouts");
                compare_tables(&tables, &self.config.compare)
            }
            None => {
                info!(sheets = sheets.len(), "unknown layout, reconciling product tables");
                let format = self.config.compare.number_format;
                let tables: Vec<KeyedTable> = sheets
                    .iter()
                    .map(|sheet| {
                        parse_product_table_with(sheet, &self.config.product_headers, &format)
                    })
                    .collect();
                compare_products(&tables, &self.config.merge, &format)
            }
        }
    }

    /// ワークブックを読み込んで照合する
    ///
    /// 各入力は並列に読み込まれます。入力の順序がファイル1・ファイル2の順序になります。
    ///
    /// # 引数
    ///
    /// * `inputs` - ワークブックを読み込むためのリーダー（2つ）
    pub fn reconcile<R: Read + Send>(
        &self,
        inputs: Vec<R>,
    ) -> Result<ComparisonResult, SverkaError> {
        if inputs.len() < 2 {
            return Err(SverkaError::InsufficientInput { got: inputs.len() });
        }

        let sheets: Vec<Sheet> = inputs
            .into_par_iter()
            .map(|input| {
                let mut parser = WorkbookParser::open(input, &self.config.input_limits)?;
                parser.read_sheet(&self.config.sheet_selector)
            })
            .collect::<Result<_, SverkaError>>()?;

        self.reconcile_sheets(&sheets)
    }

    /// 照合結果を設定された出力フォーマットで書き出す
    pub fn render<W: Write>(
        &self,
        result: &ComparisonResult,
        mut output: W,
    ) -> Result<(), SverkaError> {
        let formatter = crate::output::OutputFormatter::from_format(self.config.output_format);
        let mut writer = BufWriter::new(&mut output);
        formatter.render(result, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// 照合結果を文字列に変換
    pub fn render_to_string(&self, result: &ComparisonResult) -> Result<String, SverkaError> {
        let mut buffer = Vec::new();
        self.render(result, &mut buffer)?;

        let rendered = String::from_utf8(buffer).map_err(|e| {
            SverkaError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        Ok(rendered)
    }
}
