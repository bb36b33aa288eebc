// モデル記述子
//
// 永続化されるレコード型のメタデータ（フィールド名、種別、制約）を表現する型システム。
// ModelDescriptor, FieldDescriptor, FieldKind などの構造体を提供します。

use crate::core::error::{SchemaError, ValueError};
use crate::core::naming;
use crate::core::value::{parse_date, parse_timestamp, FieldValue};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// フィールド種別
///
/// ストレージ上の宣言型。認識できない種別はテキストとして扱われます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Boolean,
    Timestamp,
    Date,
    #[serde(other)]
    Text,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::Boolean => write!(f, "boolean"),
            FieldKind::Timestamp => write!(f, "timestamp"),
            FieldKind::Date => write!(f, "date"),
            FieldKind::Text => write!(f, "text"),
        }
    }
}

/// スキーマファイルに記述されるデフォルト値
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Boolean(bool),
    Integer(i64),
    Text(String),
}

impl DefaultValue {
    /// フィールド種別に合わせてフィールド値へ変換
    pub fn resolve(&self, field: &str, kind: FieldKind) -> Result<FieldValue, ValueError> {
        let mismatch = || ValueError::Mismatch {
            field: field.to_string(),
            expected: kind_label(kind),
        };

        match (kind, self) {
            (FieldKind::Integer, DefaultValue::Integer(v)) => Ok(FieldValue::Integer(*v)),
            (FieldKind::Boolean, DefaultValue::Boolean(v)) => Ok(FieldValue::Boolean(*v)),
            (FieldKind::Timestamp, DefaultValue::Text(v)) => {
                parse_timestamp(v).map(FieldValue::Timestamp)
            }
            (FieldKind::Date, DefaultValue::Text(v)) => parse_date(v).map(FieldValue::Date),
            (FieldKind::Text, DefaultValue::Text(v)) => Ok(FieldValue::Text(v.clone())),
            (FieldKind::Text, DefaultValue::Integer(v)) => Ok(FieldValue::Text(v.to_string())),
            (FieldKind::Text, DefaultValue::Boolean(v)) => Ok(FieldValue::Text(v.to_string())),
            _ => Err(mismatch()),
        }
    }
}

/// エラーメッセージ用の種別名
pub fn kind_label(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Integer => "an integer",
        FieldKind::Boolean => "a boolean",
        FieldKind::Timestamp => "a timestamp",
        FieldKind::Date => "a date",
        FieldKind::Text => "text",
    }
}

/// フィールド記述子
///
/// 単一フィールドの種別と制約を表現します。プロセスの生存期間中は不変です。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// フィールド名（モデル内で一意）
    pub name: String,

    /// フィールド種別
    #[serde(default = "default_kind")]
    pub kind: FieldKind,

    /// NULL許容
    #[serde(default)]
    pub nullable: bool,

    /// デフォルト値（存在すれば has-default）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,

    /// 主キー
    #[serde(default)]
    pub primary_key: bool,

    /// 保存のたびに現在時刻を設定（タイムスタンプのみ）
    #[serde(default)]
    pub auto_now: bool,

    /// 作成時のみ現在時刻を設定（タイムスタンプのみ）
    #[serde(default)]
    pub auto_now_add: bool,

    /// ヘルプテキスト
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

fn default_kind() -> FieldKind {
    FieldKind::Text
}

impl FieldDescriptor {
    /// 新しいフィールドを作成（テキスト、必須、制約なし）
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            default: None,
            primary_key: false,
            auto_now: false,
            auto_now_add: false,
            help: None,
        }
    }

    /// 主キーフィールドを作成
    pub fn primary_key(name: impl Into<String>) -> Self {
        Self {
            primary_key: true,
            ..Self::new(name, FieldKind::Integer)
        }
    }

    /// NULL許容に設定
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// デフォルト値を設定
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// auto_now を設定
    pub fn auto_now(mut self) -> Self {
        self.auto_now = true;
        self
    }

    /// auto_now_add を設定
    pub fn auto_now_add(mut self) -> Self {
        self.auto_now_add = true;
        self
    }

    /// ヘルプテキストを設定
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// デフォルト値を持つか
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// 永続化層が自動で値を管理するタイムスタンプか
    pub fn is_auto_timestamp(&self) -> bool {
        self.kind == FieldKind::Timestamp && (self.auto_now || self.auto_now_add)
    }

    /// システム管理フィールド（主キーまたは自動タイムスタンプ）か
    pub fn is_system_managed(&self) -> bool {
        self.primary_key || self.is_auto_timestamp()
    }

    /// 解決済みのデフォルト値
    pub fn default_value(&self) -> Result<Option<FieldValue>, ValueError> {
        self.default
            .as_ref()
            .map(|d| d.resolve(&self.name, self.kind))
            .transpose()
    }
}

/// モデル記述子
///
/// 永続化されるレコード型の静的メタデータ。フィールドは宣言順に保持されます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// モデル名
    pub name: String,

    /// テーブル名（省略時はモデル名の小文字）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    /// 一覧表示に使うフィールド
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_field: Option<String>,

    /// フィールド定義（宣言順）
    pub fields: Vec<FieldDescriptor>,
}

fn identifier_regex() -> &'static Regex {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
    })
}

/// 識別子として有効な名前か
pub fn is_valid_identifier(name: &str) -> bool {
    identifier_regex().is_match(name)
}

impl ModelDescriptor {
    /// 新しいモデルを作成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            display_field: None,
            fields: Vec::new(),
        }
    }

    /// フィールドを追加（ビルダー）
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// テーブル名を設定（ビルダー）
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// 一覧表示フィールドを設定（ビルダー）
    pub fn with_display_field(mut self, field: impl Into<String>) -> Self {
        self.display_field = Some(field.into());
        self
    }

    /// テーブル名を取得
    pub fn table_name(&self) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| self.name.to_lowercase())
    }

    /// 表示用ラベル（大文字のモデル名）
    pub fn label(&self) -> String {
        naming::display_label(&self.name)
    }

    /// 主キーフィールドを取得
    pub fn primary_key(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.primary_key)
    }

    /// 主キー名を取得（未定義の場合は "id"）
    pub fn primary_key_name(&self) -> &str {
        self.primary_key()
            .map(|f| f.name.as_str())
            .unwrap_or(naming::ID_PARAMETER)
    }

    /// 指定されたフィールドを取得
    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 利用者が値を与えられるフィールド（宣言順）
    pub fn editable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.is_system_managed())
    }

    /// モデル定義の妥当性を検証
    pub fn validate(&self) -> Result<(), SchemaError> {
        let model = self.name.clone();

        if !is_valid_identifier(&self.name) {
            return Err(SchemaError::InvalidIdentifier {
                model: model.clone(),
                name: self.name.clone(),
            });
        }

        if let Some(table) = &self.table {
            if !is_valid_identifier(table) {
                return Err(SchemaError::InvalidIdentifier {
                    model,
                    name: table.clone(),
                });
            }
        }

        if self.fields.is_empty() {
            return Err(SchemaError::NoFields { model });
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !is_valid_identifier(&field.name) {
                return Err(SchemaError::InvalidIdentifier {
                    model,
                    name: field.name.clone(),
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    model,
                    field: field.name.clone(),
                });
            }
            if (field.auto_now || field.auto_now_add) && field.kind != FieldKind::Timestamp {
                return Err(SchemaError::AutoTimestampOnNonTimestamp {
                    model,
                    field: field.name.clone(),
                });
            }
            if !field.primary_key && naming::is_reserved(&field.name) {
                return Err(SchemaError::ReservedFieldName {
                    model,
                    field: field.name.clone(),
                });
            }
            if let Err(e) = field.default_value() {
                return Err(SchemaError::InvalidDefault {
                    model,
                    field: field.name.clone(),
                    reason: e.to_string(),
                });
            }
        }

        let keys: Vec<&FieldDescriptor> = self.fields.iter().filter(|f| f.primary_key).collect();
        if keys.len() != 1 {
            return Err(SchemaError::PrimaryKeyCount {
                model,
                count: keys.len(),
            });
        }
        if keys[0].kind != FieldKind::Integer {
            return Err(SchemaError::PrimaryKeyNotInteger {
                model,
                field: keys[0].name.clone(),
            });
        }

        if let Some(display) = &self.display_field {
            if self.get_field(display).is_none() {
                return Err(SchemaError::UnknownDisplayField {
                    model,
                    field: display.clone(),
                });
            }
        }

        Ok(())
    }
}
