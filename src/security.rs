//! Security Module
//!
//! 入力ワークブックに対するリソース制限を実装するモジュール。
//! 巨大なファイルや行数の多いシートによるメモリ枯渇を防ぎます。

use serde::{Deserialize, Serialize};

use crate::error::SverkaError;

/// 入力の制限
///
/// ワークブック読み込み時のサイズ・行数の上限を定義します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputLimits {
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 256MB (268_435_456 bytes)
    pub max_input_size: u64,
    /// 1シートの最大行数
    /// デフォルト: 1_048_576（Excelの行数上限）
    pub max_rows: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_input_size: 268_435_456, // 256MB
            max_rows: 1_048_576,
        }
    }
}

impl InputLimits {
    /// 入力サイズの検証
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 上限以内の場合
    /// * `Err(SverkaError::SecurityViolation)` - 上限を超える場合
    pub fn check_input_size(&self, size: u64) -> Result<(), SverkaError> {
        if size > self.max_input_size {
            return Err(SverkaError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                size, self.max_input_size
            )));
        }
        Ok(())
    }

    /// シートの行数の検証
    pub fn check_rows(&self, rows: usize) -> Result<(), SverkaError> {
        if rows > self.max_rows {
            return Err(SverkaError::SecurityViolation(format!(
                "Sheet row count exceeds maximum: {} rows (max: {} rows)",
                rows, self.max_rows
            )));
        }
        Ok(())
    }

    /// 設定値の検証
    pub(crate) fn validate(&self) -> Result<(), SverkaError> {
        if self.max_input_size == 0 {
            return Err(SverkaError::Config(
                "max_input_size must be greater than 0".to_string(),
            ));
        }
        if self.max_rows == 0 {
            return Err(SverkaError::Config(
                "max_rows must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
