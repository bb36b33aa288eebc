// 型マッピング
//
// FieldKind から方言ごとのSQLカラム型への変換を一元管理します。
// タイムスタンプと日付はISO形式のテキストとして保存し、
// 真偽値はPostgreSQLのみBOOLEAN、それ以外は整数（0/1）で保存します。

use crate::core::config::Dialect;
use crate::core::schema::{FieldDescriptor, FieldKind};

/// 方言固有の型マッピング
pub trait TypeMapper: Send + Sync {
    /// FieldKindからSQL型文字列へ変換
    fn format_sql_type(&self, kind: FieldKind) -> String;

    /// 自動採番主キーのカラム定義
    fn primary_key_definition(&self) -> &'static str;

    /// 真偽値をネイティブのBOOLEAN型で保存するか
    fn native_boolean(&self) -> bool {
        false
    }
}

/// PostgreSQL用型マッパー
pub struct PostgresTypeMapper;

impl TypeMapper for PostgresTypeMapper {
    fn format_sql_type(&self, kind: FieldKind) -> String {
        match kind {
            FieldKind::Integer => "BIGINT",
            FieldKind::Boolean => "BOOLEAN",
            FieldKind::Timestamp | FieldKind::Date | FieldKind::Text => "TEXT",
        }
        .to_string()
    }

    fn primary_key_definition(&self) -> &'static str {
        "BIGSERIAL PRIMARY KEY"
    }

    fn native_boolean(&self) -> bool {
        true
    }
}

/// MySQL用型マッパー
pub struct MySqlTypeMapper;

impl TypeMapper for MySqlTypeMapper {
    fn format_sql_type(&self, kind: FieldKind) -> String {
        match kind {
            FieldKind::Integer => "BIGINT",
            FieldKind::Boolean => "SMALLINT",
            FieldKind::Timestamp | FieldKind::Date => "VARCHAR(32)",
            FieldKind::Text => "TEXT",
        }
        .to_string()
    }

    fn primary_key_definition(&self) -> &'static str {
        "BIGINT AUTO_INCREMENT PRIMARY KEY"
    }
}

/// SQLite用型マッパー
pub struct SqliteTypeMapper;

impl TypeMapper for SqliteTypeMapper {
    fn format_sql_type(&self, kind: FieldKind) -> String {
        // SQLiteは型アフィニティによる簡略化された型システムを持つ
        match kind {
            FieldKind::Integer | FieldKind::Boolean => "INTEGER",
            FieldKind::Timestamp | FieldKind::Date | FieldKind::Text => "TEXT",
        }
        .to_string()
    }

    fn primary_key_definition(&self) -> &'static str {
        "INTEGER PRIMARY KEY AUTOINCREMENT"
    }
}

/// 型マッピングサービス
///
/// 方言に依存しない共通インターフェースで型変換を提供します。
pub struct TypeMappingService {
    dialect: Dialect,
    mapper: Box<dyn TypeMapper>,
}

impl Clone for TypeMappingService {
    fn clone(&self) -> Self {
        Self::new(self.dialect)
    }
}

impl std::fmt::Debug for TypeMappingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeMappingService")
            .field("dialect", &self.dialect)
            .finish()
    }
}

impl TypeMappingService {
    /// 新しいTypeMappingServiceを作成
    pub fn new(dialect: Dialect) -> Self {
        let mapper: Box<dyn TypeMapper> = match dialect {
            Dialect::PostgreSQL => Box::new(PostgresTypeMapper),
            Dialect::MySQL => Box::new(MySqlTypeMapper),
            Dialect::SQLite => Box::new(SqliteTypeMapper),
        };
        Self { dialect, mapper }
    }

    /// 方言を取得
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// 真偽値をネイティブ型で扱うか
    pub fn native_boolean(&self) -> bool {
        self.mapper.native_boolean()
    }

    /// フィールド定義からカラム定義を生成
    ///
    /// 例: `"title" TEXT NOT NULL`
    pub fn column_definition(&self, field: &FieldDescriptor) -> String {
        let name = self.dialect.quote_identifier(&field.name);
        if field.primary_key {
            return format!("{} {}", name, self.mapper.primary_key_definition());
        }

        let sql_type = self.mapper.format_sql_type(field.kind);
        if field.nullable {
            format!("{} {}", name, sql_type)
        } else {
            format!("{} {} NOT NULL", name, sql_type)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_definition_sqlite() {
        let service = TypeMappingService::new(Dialect::SQLite);

        assert_eq!(
            service.column_definition(&FieldDescriptor::primary_key("id")),
            "\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"
        );
        assert_eq!(
            service.column_definition(&FieldDescriptor::new("done", FieldKind::Boolean)),
            "\"done\" INTEGER NOT NULL"
        );
        assert_eq!(
            service.column_definition(&FieldDescriptor::new("note", FieldKind::Text).nullable()),
            "\"note\" TEXT"
        );
    }

    #[test]
    fn test_column_definition_postgres() {
        let service = TypeMappingService::new(Dialect::PostgreSQL);

        assert!(service.native_boolean());
        assert_eq!(
            service.column_definition(&FieldDescriptor::primary_key("id")),
            "\"id\" BIGSERIAL PRIMARY KEY"
        );
        assert_eq!(
            service.column_definition(&FieldDescriptor::new("done", FieldKind::Boolean)),
            "\"done\" BOOLEAN NOT NULL"
        );
    }

    #[test]
    fn test_column_definition_mysql() {
        let service = TypeMappingService::new(Dialect::MySQL);

        assert!(!service.native_boolean());
        assert_eq!(
            service.column_definition(&FieldDescriptor::new("due", FieldKind::Date)),
            "`due` VARCHAR(32) NOT NULL"
        );
    }
}
