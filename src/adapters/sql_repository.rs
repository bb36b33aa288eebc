// SQLリポジトリ
//
// SQLxのAnyドライバーを使用したModelRepositoryの実装。
// モデル記述子からSQLを組み立て、方言ごとのプレースホルダーとIDの取得方法を切り替えます。

use crate::adapters::repository::{
    check_assignments, not_found, prepare_insert, touch_auto_now, ModelRepository,
};
use crate::adapters::type_mapping::TypeMappingService;
use crate::core::config::Dialect;
use crate::core::error::RepositoryError;
use crate::core::record::{Assignments, Record};
use crate::core::schema::{FieldKind, ModelDescriptor};
use crate::core::value::FieldValue;
use async_trait::async_trait;
use chrono::Local;
use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyPool, Row};
use tracing::debug;

type AnyQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

/// SQLリポジトリ
#[derive(Debug, Clone)]
pub struct SqlRepository {
    pool: AnyPool,
    dialect: Dialect,
    types: TypeMappingService,
}

impl SqlRepository {
    /// 新しいSqlRepositoryを作成
    pub fn new(pool: AnyPool, dialect: Dialect) -> Self {
        Self {
            pool,
            dialect,
            types: TypeMappingService::new(dialect),
        }
    }

    /// 接続プールを取得
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// モデルのテーブルを作成（存在しない場合のみ）
    pub async fn ensure_table(&self, model: &ModelDescriptor) -> Result<(), RepositoryError> {
        let sql = self.create_table_sql(model);
        debug!(model = %model.name, sql = %sql, "Ensuring table");
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| query_error(&format!("Failed to create table for {}", model.name), &sql, e))
    }

    /// CREATE TABLE文を生成
    pub fn create_table_sql(&self, model: &ModelDescriptor) -> String {
        let columns: Vec<String> = model
            .fields
            .iter()
            .map(|field| self.types.column_definition(field))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table(model),
            columns.join(", ")
        )
    }

    fn table(&self, model: &ModelDescriptor) -> String {
        self.dialect.quote_identifier(&model.table_name())
    }

    fn quote(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    fn select_sql(&self, model: &ModelDescriptor) -> String {
        let columns: Vec<String> = model.fields.iter().map(|f| self.quote(&f.name)).collect();
        format!("SELECT {} FROM {}", columns.join(", "), self.table(model))
    }

    fn insert_sql(&self, model: &ModelDescriptor, values: &[(String, FieldValue)]) -> String {
        let table = self.table(model);
        let mut sql = if values.is_empty() {
            match self.dialect {
                Dialect::MySQL => format!("INSERT INTO {} () VALUES ()", table),
                Dialect::PostgreSQL | Dialect::SQLite => {
                    format!("INSERT INTO {} DEFAULT VALUES", table)
                }
            }
        } else {
            let columns: Vec<String> = values.iter().map(|(name, _)| self.quote(name)).collect();
            let placeholders: Vec<String> = (1..=values.len())
                .map(|i| self.dialect.placeholder(i))
                .collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        // MySQLのみ last_insert_id でIDを取得
        if self.dialect != Dialect::MySQL {
            sql.push_str(&format!(" RETURNING {}", self.quote(model.primary_key_name())));
        }
        sql
    }

    fn update_sql(&self, model: &ModelDescriptor, columns: &[String]) -> String {
        let assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{} = {}", self.quote(name), self.dialect.placeholder(i + 1)))
            .collect();
        format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.table(model),
            assignments.join(", "),
            self.quote(model.primary_key_name()),
            self.dialect.placeholder(columns.len() + 1)
        )
    }

    /// フィールド種別に応じて値をバインド
    ///
    /// NULLも型付きでバインドしないとPostgreSQLで型不一致になる。
    fn bind_value<'q>(&self, query: AnyQuery<'q>, kind: FieldKind, value: &FieldValue) -> AnyQuery<'q> {
        match (kind, value) {
            (FieldKind::Integer, FieldValue::Integer(v)) => query.bind(*v),
            (FieldKind::Integer, _) => query.bind(Option::<i64>::None),
            (FieldKind::Boolean, FieldValue::Boolean(v)) if self.types.native_boolean() => {
                query.bind(*v)
            }
            (FieldKind::Boolean, FieldValue::Boolean(v)) => query.bind(i64::from(*v)),
            (FieldKind::Boolean, _) if self.types.native_boolean() => {
                query.bind(Option::<bool>::None)
            }
            (FieldKind::Boolean, _) => query.bind(Option::<i64>::None),
            (_, value) => query.bind(value.to_storage_text()),
        }
    }

    fn bind_values<'q>(
        &self,
        model: &ModelDescriptor,
        mut query: AnyQuery<'q>,
        values: &[(String, FieldValue)],
    ) -> AnyQuery<'q> {
        for (name, value) in values {
            let kind = model
                .get_field(name)
                .map(|f| f.kind)
                .unwrap_or(FieldKind::Text);
            query = self.bind_value(query, kind, value);
        }
        query
    }

    /// 行をレコードに変換
    fn decode_row(&self, model: &ModelDescriptor, row: &AnyRow) -> Result<Record, RepositoryError> {
        let mut values = Vec::with_capacity(model.fields.len());
        let mut id = None;

        for field in &model.fields {
            let name = field.name.as_str();
            let value = match field.kind {
                FieldKind::Integer => row
                    .try_get::<Option<i64>, _>(name)
                    .map_err(|e| decode_error(name, e))?
                    .map_or(FieldValue::Null, FieldValue::Integer),
                FieldKind::Boolean => {
                    let native = row.try_get::<Option<bool>, _>(name).ok();
                    let flag = match native {
                        Some(flag) => flag,
                        None => row
                            .try_get::<Option<i64>, _>(name)
                            .map_err(|e| decode_error(name, e))?
                            .map(|v| v != 0),
                    };
                    flag.map_or(FieldValue::Null, FieldValue::Boolean)
                }
                kind => match row
                    .try_get::<Option<String>, _>(name)
                    .map_err(|e| decode_error(name, e))?
                {
                    Some(text) => FieldValue::parse(kind, &text).map_err(|source| {
                        RepositoryError::Decode {
                            column: name.to_string(),
                            source,
                        }
                    })?,
                    None => FieldValue::Null,
                },
            };

            if field.primary_key {
                id = value.as_integer();
            }
            values.push((field.name.clone(), value));
        }

        let id = id.ok_or_else(|| RepositoryError::Query {
            message: format!("Row of {} has no primary key value", model.name),
            sql: None,
        })?;
        Ok(Record::new(model.name.clone(), id, values))
    }
}

fn query_error(message: &str, sql: &str, e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query {
        message: format!("{}: {}", message, e),
        sql: Some(sql.to_string()),
    }
}

fn decode_error(column: &str, e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query {
        message: format!("Failed to read column '{}': {}", column, e),
        sql: None,
    }
}

#[async_trait]
impl ModelRepository for SqlRepository {
    async fn create(
        &self,
        model: &ModelDescriptor,
        assignments: &Assignments,
    ) -> Result<Record, RepositoryError> {
        let values = prepare_insert(model, assignments, Local::now().naive_local())?;
        let sql = self.insert_sql(model, &values);
        debug!(model = %model.name, sql = %sql, "Inserting instance");

        let query = self.bind_values(model, sqlx::query(&sql), &values);
        let id = if self.dialect != Dialect::MySQL {
            let row = query
                .fetch_one(&self.pool)
                .await
                .map_err(|e| query_error("Failed to insert instance", &sql, e))?;
            row.try_get::<i64, _>(model.primary_key_name())
                .map_err(|e| decode_error(model.primary_key_name(), e))?
        } else {
            query
                .execute(&self.pool)
                .await
                .map_err(|e| query_error("Failed to insert instance", &sql, e))?
                .last_insert_id()
                .ok_or_else(|| RepositoryError::Query {
                    message: "Database did not report the inserted ID".to_string(),
                    sql: Some(sql.clone()),
                })?
        };

        let mut record_values = Vec::with_capacity(model.fields.len());
        for field in &model.fields {
            let value = if field.primary_key {
                FieldValue::Integer(id)
            } else {
                values
                    .iter()
                    .find(|(name, _)| name == &field.name)
                    .map(|(_, value)| value.clone())
                    .unwrap_or(FieldValue::Null)
            };
            record_values.push((field.name.clone(), value));
        }

        Ok(Record::new(model.name.clone(), id, record_values))
    }

    async fn get(&self, model: &ModelDescriptor, id: i64) -> Result<Record, RepositoryError> {
        let sql = format!(
            "{} WHERE {} = {}",
            self.select_sql(model),
            self.quote(model.primary_key_name()),
            self.dialect.placeholder(1)
        );
        debug!(model = %model.name, id, "Fetching instance");

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("Failed to fetch instance", &sql, e))?;

        match row {
            Some(row) => self.decode_row(model, &row),
            None => Err(not_found(model, id)),
        }
    }

    async fn all(&self, model: &ModelDescriptor) -> Result<Vec<Record>, RepositoryError> {
        let sql = format!(
            "{} ORDER BY {}",
            self.select_sql(model),
            self.quote(model.primary_key_name())
        );
        debug!(model = %model.name, "Fetching all instances");

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("Failed to fetch instances", &sql, e))?;

        rows.iter().map(|row| self.decode_row(model, row)).collect()
    }

    async fn save(
        &self,
        model: &ModelDescriptor,
        record: &Record,
    ) -> Result<Record, RepositoryError> {
        let mut record = record.clone();
        touch_auto_now(model, &mut record, Local::now().naive_local())?;

        let values: Vec<(String, FieldValue)> = model
            .fields
            .iter()
            .filter(|f| !f.primary_key)
            .map(|f| {
                (
                    f.name.clone(),
                    record.get(&f.name).cloned().unwrap_or(FieldValue::Null),
                )
            })
            .collect();
        check_assignments(model, &values)?;

        if values.is_empty() {
            return Ok(record);
        }

        let columns: Vec<String> = values.iter().map(|(name, _)| name.clone()).collect();
        let sql = self.update_sql(model, &columns);
        debug!(model = %model.name, id = record.id, "Updating instance");

        let result = self
            .bind_values(model, sqlx::query(&sql), &values)
            .bind(record.id)
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("Failed to update instance", &sql, e))?;

        // MySQLは値が変わらない行を影響行数に含めないため、0件を未検出とみなさない
        if result.rows_affected() == 0 && self.dialect != Dialect::MySQL {
            return Err(not_found(model, record.id));
        }

        Ok(record)
    }

    async fn delete(
        &self,
        model: &ModelDescriptor,
        record: &Record,
    ) -> Result<(), RepositoryError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            self.table(model),
            self.quote(model.primary_key_name()),
            self.dialect.placeholder(1)
        );
        debug!(model = %model.name, id = record.id, "Deleting instance");

        let result = sqlx::query(&sql)
            .bind(record.id)
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("Failed to delete instance", &sql, e))?;

        if result.rows_affected() == 0 {
            return Err(not_found(model, record.id));
        }
        Ok(())
    }
}
