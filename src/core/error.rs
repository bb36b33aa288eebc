// エラー型定義
//
// アプリケーション全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、SchemaError, ValueError, RepositoryError, ConfigError を定義します。

use thiserror::Error;

/// モデル定義エラー
///
/// モデル記述子が不正な場合に発生します。アプリ構築時に即座に失敗させるための型エラーです。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Invalid identifier
    #[error("Invalid identifier '{name}' in model '{model}': names must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidIdentifier {
        /// モデル名
        model: String,
        /// 不正な名前
        name: String,
    },

    /// Model has no fields
    #[error("Model '{model}' has no fields")]
    NoFields {
        /// モデル名
        model: String,
    },

    /// Duplicate field name
    #[error("Duplicate field '{field}' in model '{model}'")]
    DuplicateField {
        /// モデル名
        model: String,
        /// フィールド名
        field: String,
    },

    /// Primary key count mismatch
    #[error("Model '{model}' must declare exactly one primary key (found {count})")]
    PrimaryKeyCount {
        /// モデル名
        model: String,
        /// 検出された主キー数
        count: usize,
    },

    /// Primary key is not an integer
    #[error("Primary key '{field}' of model '{model}' must be an integer field")]
    PrimaryKeyNotInteger {
        /// モデル名
        model: String,
        /// フィールド名
        field: String,
    },

    /// auto_now / auto_now_add on a non-timestamp field
    #[error("Field '{field}' of model '{model}' uses auto_now/auto_now_add but is not a timestamp")]
    AutoTimestampOnNonTimestamp {
        /// モデル名
        model: String,
        /// フィールド名
        field: String,
    },

    /// Field name collides with the identifier parameter or a global option
    #[error("Field '{field}' of model '{model}' collides with a reserved argument name")]
    ReservedFieldName {
        /// モデル名
        model: String,
        /// フィールド名
        field: String,
    },

    /// Default value does not match the field kind
    #[error("Default value of field '{field}' in model '{model}' is invalid: {reason}")]
    InvalidDefault {
        /// モデル名
        model: String,
        /// フィールド名
        field: String,
        /// 不正な理由
        reason: String,
    },

    /// display_field refers to an unknown field
    #[error("display_field '{field}' is not a field of model '{model}'")]
    UnknownDisplayField {
        /// モデル名
        model: String,
        /// フィールド名
        field: String,
    },
}

impl SchemaError {
    /// 主キー関連のエラーかどうか
    pub fn is_primary_key(&self) -> bool {
        matches!(
            self,
            SchemaError::PrimaryKeyCount { .. } | SchemaError::PrimaryKeyNotInteger { .. }
        )
    }
}

/// 値変換エラー
///
/// CLIから受け取った文字列やストレージの値をフィールド値に変換できない場合に発生します。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Unparseable input
    #[error("Invalid {expected} value '{input}'")]
    Parse {
        /// 期待する型
        expected: &'static str,
        /// 入力文字列
        input: String,
    },

    /// Unknown field
    #[error("Unknown field '{field}'")]
    UnknownField {
        /// フィールド名
        field: String,
    },

    /// Type mismatch between value and field kind
    #[error("Field '{field}' expects {expected}")]
    Mismatch {
        /// フィールド名
        field: String,
        /// 期待する型
        expected: &'static str,
    },
}

/// リポジトリエラー
///
/// 永続化層の操作時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Instance not found
    #[error("{model} with ID {id} not found.")]
    NotFound {
        /// 表示用モデル名（大文字）
        model: String,
        /// 識別子
        id: i64,
    },

    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Query execution error
    #[error("Query execution error: {message}")]
    Query {
        /// エラーメッセージ
        message: String,
        /// 失敗したSQL
        sql: Option<String>,
    },

    /// Stored value could not be decoded
    #[error("Failed to decode column '{column}': {source}")]
    Decode {
        /// カラム名
        column: String,
        /// 変換エラー
        #[source]
        source: ValueError,
    },

    /// Assignment rejected before reaching the store
    #[error(transparent)]
    Value(#[from] ValueError),
}

impl RepositoryError {
    /// 未検出エラーかどうか
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    /// 接続エラーかどうか
    pub fn is_connection(&self) -> bool {
        matches!(self, RepositoryError::Connection { .. })
    }

    /// クエリエラーかどうか
    pub fn is_query(&self) -> bool {
        matches!(self, RepositoryError::Query { .. })
    }
}

/// 設定エラー
///
/// 設定ファイルの読み込み・検証時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// バージョン未指定
    #[error("Config file version is not specified")]
    MissingVersion,

    /// 環境設定なし
    #[error("At least one environment configuration is required")]
    NoEnvironments,

    /// 環境が見つからない
    #[error("Environment '{name}' not found. Available environments: {available:?}")]
    EnvironmentNotFound {
        /// 指定された環境名
        name: String,
        /// 利用可能な環境名リスト
        available: Vec<String>,
    },

    /// データベース名未指定
    #[error("Database name is not specified")]
    MissingDatabaseName,

    /// 環境設定が不正
    #[error("Invalid configuration for environment '{environment}': {source}")]
    InvalidEnvironment {
        /// 環境名
        environment: String,
        /// 元のエラー
        #[source]
        source: Box<ConfigError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = RepositoryError::NotFound {
            model: "TASK".to_string(),
            id: 42,
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "TASK with ID 42 not found.");
    }

    #[test]
    fn test_schema_error_is_primary_key() {
        let err = SchemaError::PrimaryKeyCount {
            model: "Task".to_string(),
            count: 0,
        };
        assert!(err.is_primary_key());
        assert!(err.to_string().contains("exactly one primary key"));
    }

    #[test]
    fn test_value_error_from_conversion() {
        let err: RepositoryError = ValueError::UnknownField {
            field: "missing".to_string(),
        }
        .into();
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Unknown field 'missing'");
    }

    #[test]
    fn test_invalid_environment_wraps_source() {
        let err = ConfigError::InvalidEnvironment {
            environment: "production".to_string(),
            source: Box::new(ConfigError::MissingDatabaseName),
        };
        assert!(err.to_string().contains("production"));
        assert!(err.to_string().contains("Database name is not specified"));
    }
}
