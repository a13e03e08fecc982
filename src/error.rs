//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// sverkaクレート全体で使用するエラー型
///
/// ワークブックの読み込み、レイアウト解析、照合処理中に発生する
/// 呼び出し側へ伝播すべきエラーを統一的に扱います。
///
/// セル単位の異常（数値として解釈できない値、キーを持たない行）は
/// 解析中にローカルで回復されるため、通常はこの型として表面化しません。
/// 未知のレイアウトもエラーではなく、`Layout::Unknown` として扱われます。
///
/// # 使用例
///
/// ```rust,no_run
/// use sverka::{ReconcilerBuilder, SverkaError};
/// use std::fs::File;
///
/// fn run(a: &str, b: &str) -> Result<(), SverkaError> {
///     let reconciler = ReconcilerBuilder::new().build()?;
///     let result = reconciler.reconcile(vec![File::open(a)?, File::open(b)?])?;
///     println!("{}", reconciler.render_to_string(&result)?);
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum SverkaError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ワークブックの解析中に発生したエラー（calamine由来）
    #[error("Failed to parse workbook: {0}")]
    Parse(#[from] calamine::Error),

    /// JSON出力の生成に失敗したエラー
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 設定の検証に失敗したエラー
    ///
    /// `ReconcilerBuilder::build()`時に無効な設定が検出された場合に発生します。
    #[error("Configuration error: {0}")]
    Config(String),

    /// 比較に必要な入力（テーブル、シート、ファイル）が2つ未満
    #[error("At least two inputs are required for comparison, got {got}")]
    InsufficientInput {
        /// 渡された入力の数
        got: usize,
    },

    /// 商品照合モードで、テーブル数がちょうど2つではない
    #[error("Product merge requires exactly two tables, got {got}")]
    AmbiguousMergeInput {
        /// 渡されたテーブルの数
        got: usize,
    },

    /// ロケール正規化後も数値として解釈できない値
    ///
    /// 解析処理の内部では0または欠損値として回復されます。
    /// `parse_decimal`を直接呼び出した場合のみ呼び出し側に返ります。
    #[error("Malformed numeric value: '{0}'")]
    MalformedNumber(String),

    /// 旧形式（BIFF5など）のため読み込めないワークブック
    ///
    /// 呼び出し側で外部コンバーターを実行し、変換後のファイルで再試行してください。
    #[error("Legacy workbook format must be converted before reading: {0}")]
    LegacyFormat(String),

    /// 指定されたシートが存在しない
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// 入力サイズなどの制限に違反したエラー
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: SverkaError = io_err.into();

        match error {
            SverkaError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
                assert_eq!(e.to_string(), "File not found");
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_parse_error_display() {
        let parse_err = calamine::Error::Msg("Corrupted file");
        let error: SverkaError = parse_err.into();

        let error_msg = error.to_string();
        assert!(error_msg.contains("Failed to parse workbook"));
        assert!(error_msg.contains("Corrupted file"));
    }

    #[test]
    fn test_insufficient_input_display() {
        let error = SverkaError::InsufficientInput { got: 1 };
        assert_eq!(
            error.to_string(),
            "At least two inputs are required for comparison, got 1"
        );
    }

    #[test]
    fn test_ambiguous_merge_input_display() {
        let error = SverkaError::AmbiguousMergeInput { got: 3 };
        assert!(error.to_string().contains("exactly two"));
        assert!(error.to_string().contains('3'));
    }

    // ?演算子による変換の確認
    #[test]
    fn test_error_conversion_with_question_mark() {
        fn io_operation() -> Result<(), SverkaError> {
            let _file = std::fs::File::open("nonexistent_statement.xlsx")?;
            Ok(())
        }

        match io_operation() {
            Err(SverkaError::Io(_)) => {}
            _ => panic!("Expected Io error from ? operator"),
        }
    }

    #[test]
    fn test_all_error_formats() {
        let config_err = SverkaError::Config("test config".to_string());
        assert!(config_err.to_string().starts_with("Configuration error"));

        let number_err = SverkaError::MalformedNumber("12,3,4".to_string());
        assert!(number_err.to_string().contains("'12,3,4'"));

        let legacy_err = SverkaError::LegacyFormat("BIFF5".to_string());
        assert!(legacy_err.to_string().starts_with("Legacy workbook format"));

        let sheet_err = SverkaError::SheetNotFound("Лист1".to_string());
        assert!(sheet_err.to_string().contains("Лист1"));
    }
}
