// インメモリリポジトリ
//
// プロセス内でレコードを保持するModelRepositoryの実装。
// テストや組み込み用途で、データベースなしにコマンドを実行するために使います。

use crate::adapters::repository::{
    check_assignments, not_found, prepare_insert, touch_auto_now, ModelRepository,
};
use crate::core::error::RepositoryError;
use crate::core::record::{Assignments, Record};
use crate::core::schema::ModelDescriptor;
use crate::core::value::FieldValue;
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: Vec<Record>,
}

/// インメモリリポジトリ
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: Mutex<HashMap<String, Table>>,
    deletes: AtomicUsize,
    clock: Option<NaiveDateTime>,
}

impl MemoryRepository {
    /// 新しいMemoryRepositoryを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 固定時刻を使うMemoryRepositoryを作成（auto タイムスタンプの検証用）
    pub fn with_clock(now: NaiveDateTime) -> Self {
        Self {
            clock: Some(now),
            ..Self::default()
        }
    }

    /// これまでに実行された削除の回数
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// 保持しているレコード数
    pub fn len(&self, model: &ModelDescriptor) -> usize {
        self.lock()
            .get(&model.table_name())
            .map_or(0, |table| table.rows.len())
    }

    /// レコードを保持していないか
    pub fn is_empty(&self, model: &ModelDescriptor) -> bool {
        self.len(model) == 0
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.unwrap_or_else(|| Local::now().naive_local())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Table>> {
        // 毒化は無視（保持データは単純な値のみ）
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ModelRepository for MemoryRepository {
    async fn create(
        &self,
        model: &ModelDescriptor,
        assignments: &Assignments,
    ) -> Result<Record, RepositoryError> {
        let values = prepare_insert(model, assignments, self.now())?;

        let mut tables = self.lock();
        let table = tables.entry(model.table_name()).or_default();
        table.next_id += 1;
        let id = table.next_id;

        let record_values = model
            .fields
            .iter()
            .map(|field| {
                let value = if field.primary_key {
                    FieldValue::Integer(id)
                } else {
                    values
                        .iter()
                        .find(|(name, _)| name == &field.name)
                        .map(|(_, value)| value.clone())
                        .unwrap_or(FieldValue::Null)
                };
                (field.name.clone(), value)
            })
            .collect();

        let record = Record::new(model.name.clone(), id, record_values);
        table.rows.push(record.clone());
        Ok(record)
    }

    async fn get(&self, model: &ModelDescriptor, id: i64) -> Result<Record, RepositoryError> {
        self.lock()
            .get(&model.table_name())
            .and_then(|table| table.rows.iter().find(|r| r.id == id))
            .cloned()
            .ok_or_else(|| not_found(model, id))
    }

    async fn all(&self, model: &ModelDescriptor) -> Result<Vec<Record>, RepositoryError> {
        Ok(self
            .lock()
            .get(&model.table_name())
            .map(|table| table.rows.clone())
            .unwrap_or_default())
    }

    async fn save(
        &self,
        model: &ModelDescriptor,
        record: &Record,
    ) -> Result<Record, RepositoryError> {
        let mut record = record.clone();
        touch_auto_now(model, &mut record, self.now())?;
        let editable: Assignments = record
            .values
            .iter()
            .filter(|(name, _)| name != model.primary_key_name())
            .cloned()
            .collect();
        check_assignments(model, &editable)?;

        let mut tables = self.lock();
        let slot = tables
            .get_mut(&model.table_name())
            .and_then(|table| table.rows.iter_mut().find(|r| r.id == record.id))
            .ok_or_else(|| not_found(model, record.id))?;
        *slot = record.clone();
        Ok(record)
    }

    async fn delete(
        &self,
        model: &ModelDescriptor,
        record: &Record,
    ) -> Result<(), RepositoryError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);

        let mut tables = self.lock();
        let table = tables
            .get_mut(&model.table_name())
            .ok_or_else(|| not_found(model, record.id))?;
        let before = table.rows.len();
        table.rows.retain(|r| r.id != record.id);
        if table.rows.len() == before {
            return Err(not_found(model, record.id));
        }
        Ok(())
    }
}
