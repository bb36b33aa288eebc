// フィールド型マッパー
//
// フィールドの宣言種別から、CLIに公開するスカラー型を決定します。
// 各CLI型に対応するclapの値パーサーもここで提供します。

use crate::core::schema::{FieldDescriptor, FieldKind};
use crate::core::value::{parse_bool, parse_date, parse_timestamp, FieldValue};
use clap::builder::ValueParser;

/// CLIに公開するスカラー型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliType {
    Integer,
    Boolean,
    Timestamp,
    Date,
    Text,
}

impl CliType {
    /// ヘルプに表示する値名
    pub fn value_name(&self) -> &'static str {
        match self {
            CliType::Integer => "INTEGER",
            CliType::Boolean => "BOOLEAN",
            CliType::Timestamp => "TIMESTAMP",
            CliType::Date => "DATE",
            CliType::Text => "TEXT",
        }
    }

    /// clapの値パーサー
    ///
    /// パース結果は常に `FieldValue` として ArgMatches に格納されます。
    pub fn value_parser(&self) -> ValueParser {
        match self {
            CliType::Integer => ValueParser::new(|s: &str| -> Result<FieldValue, String> {
                s.trim()
                    .parse::<i64>()
                    .map(FieldValue::Integer)
                    .map_err(|e| e.to_string())
            }),
            CliType::Boolean => ValueParser::new(|s: &str| -> Result<FieldValue, String> {
                parse_bool(s)
                    .map(FieldValue::Boolean)
                    .map_err(|e| e.to_string())
            }),
            CliType::Timestamp => ValueParser::new(|s: &str| -> Result<FieldValue, String> {
                parse_timestamp(s)
                    .map(FieldValue::Timestamp)
                    .map_err(|e| e.to_string())
            }),
            CliType::Date => ValueParser::new(|s: &str| -> Result<FieldValue, String> {
                parse_date(s).map(FieldValue::Date).map_err(|e| e.to_string())
            }),
            CliType::Text => ValueParser::new(|s: &str| -> Result<FieldValue, String> {
                Ok(FieldValue::Text(s.to_string()))
            }),
        }
    }
}

/// フィールド記述子からCLI型を決定
///
/// 全種別に対して定義された純粋関数です。認識できない種別はスキーマ読み込み時に
/// `FieldKind::Text` へ落とされるため、ここではテキストとして扱われます。
pub fn map_field_type(field: &FieldDescriptor) -> CliType {
    match field.kind {
        FieldKind::Integer => CliType::Integer,
        FieldKind::Boolean => CliType::Boolean,
        FieldKind::Timestamp => CliType::Timestamp,
        FieldKind::Date => CliType::Date,
        FieldKind::Text => CliType::Text,
    }
}
