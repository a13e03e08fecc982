//! Parser Module
//!
//! calamineを使用したワークブック読み込みの実装。
//! 照合エンジンはこのモジュールが生成する`Sheet`のみを扱います。

mod workbook;

pub use workbook::{sniff_file_kind, FileKind, WorkbookParser};
