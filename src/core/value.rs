// フィールド値
//
// モデルインスタンスが保持する値と、文字列からの変換規則を定義します。
// CLI入力とストレージ（ISO形式のテキスト）の双方で同じ変換規則を使います。

use crate::core::error::ValueError;
use crate::core::schema::FieldKind;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// CLIおよびストレージで受け付けるタイムスタンプ形式
pub const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// 日付形式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 表示用のタイムスタンプ形式
const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// フィールド値
///
/// `Null` は「値が指定されていない」ことを表すヌル番兵も兼ねます。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    /// ヌルかどうか
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// 値がフィールド種別に適合するか（ヌルは常に適合）
    pub fn matches_kind(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (FieldValue::Null, _)
                | (FieldValue::Integer(_), FieldKind::Integer)
                | (FieldValue::Boolean(_), FieldKind::Boolean)
                | (FieldValue::Timestamp(_), FieldKind::Timestamp)
                | (FieldValue::Date(_), FieldKind::Date)
                | (FieldValue::Text(_), FieldKind::Text)
        )
    }

    /// 整数値として取得
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// フィールド種別に従って文字列から値を生成
    pub fn parse(kind: FieldKind, input: &str) -> Result<FieldValue, ValueError> {
        match kind {
            FieldKind::Integer => input
                .trim()
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| ValueError::Parse {
                    expected: "integer",
                    input: input.to_string(),
                }),
            FieldKind::Boolean => parse_bool(input).map(FieldValue::Boolean),
            FieldKind::Timestamp => parse_timestamp(input).map(FieldValue::Timestamp),
            FieldKind::Date => parse_date(input).map(FieldValue::Date),
            FieldKind::Text => Ok(FieldValue::Text(input.to_string())),
        }
    }

    /// ストレージ用のテキスト表現（タイムスタンプ・日付はISO形式）
    pub fn to_storage_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Integer(v) => Some(v.to_string()),
            FieldValue::Boolean(v) => Some(v.to_string()),
            FieldValue::Timestamp(v) => Some(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            FieldValue::Date(v) => Some(v.format(DATE_FORMAT).to_string()),
            FieldValue::Text(v) => Some(v.clone()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Boolean(v) => write!(f, "{}", v),
            FieldValue::Timestamp(v) => write!(f, "{}", v.format(TIMESTAMP_DISPLAY_FORMAT)),
            FieldValue::Date(v) => write!(f, "{}", v.format(DATE_FORMAT)),
            FieldValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// 真偽値をパース（true/false, yes/no, on/off, 1/0）
pub fn parse_bool(input: &str) -> Result<bool, ValueError> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Ok(true),
        "false" | "no" | "n" | "off" | "0" => Ok(false),
        _ => Err(ValueError::Parse {
            expected: "boolean",
            input: input.to_string(),
        }),
    }
}

/// タイムスタンプをパース
///
/// `YYYY-MM-DDTHH:MM:SS`、`YYYY-MM-DD HH:MM:SS`（小数秒は任意）、
/// または日付のみ（00:00:00として扱う）を受け付けます。
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime, ValueError> {
    let trimmed = input.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }

    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ValueError::Parse {
            expected: "timestamp",
            input: input.to_string(),
        })
}

/// 日付をパース（`YYYY-MM-DD`）
pub fn parse_date(input: &str) -> Result<NaiveDate, ValueError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|_| ValueError::Parse {
        expected: "date",
        input: input.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("true"), Ok(true));
        assert_eq!(parse_bool("Yes"), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert_eq!(parse_bool("off"), Ok(false));
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();

        assert_eq!(parse_timestamp("2024-03-01T09:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01 09:30:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("2023-02-29").is_err());
    }

    #[test]
    fn test_parse_by_kind() {
        assert_eq!(
            FieldValue::parse(FieldKind::Integer, "42").unwrap(),
            FieldValue::Integer(42)
        );
        assert_eq!(
            FieldValue::parse(FieldKind::Text, "buy milk").unwrap(),
            FieldValue::Text("buy milk".to_string())
        );
        assert!(FieldValue::parse(FieldKind::Integer, "forty-two").is_err());
    }

    #[test]
    fn test_storage_text_round_trips_timestamp() {
        let value = FieldValue::parse(FieldKind::Timestamp, "2024-03-01 09:30:00").unwrap();
        let stored = value.to_storage_text().unwrap();
        assert_eq!(FieldValue::parse(FieldKind::Timestamp, &stored).unwrap(), value);
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::Null.to_string(), "null");
        assert_eq!(FieldValue::Boolean(false).to_string(), "false");
        assert_eq!(
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()).to_string(),
            "2024-01-05"
        );
    }

    #[test]
    fn test_matches_kind() {
        assert!(FieldValue::Null.matches_kind(FieldKind::Integer));
        assert!(FieldValue::Boolean(true).matches_kind(FieldKind::Boolean));
        assert!(!FieldValue::Text("x".to_string()).matches_kind(FieldKind::Integer));
    }

    #[test]
    fn test_json_serialization() {
        assert_eq!(serde_json::to_string(&FieldValue::Null).unwrap(), "null");
        assert_eq!(
            serde_json::to_string(&FieldValue::Boolean(true)).unwrap(),
            "true"
        );
        assert_eq!(
            serde_json::to_string(&FieldValue::Text("a".to_string())).unwrap(),
            "\"a\""
        );
    }
}
