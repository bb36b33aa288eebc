// 永続化クライアントインターフェース
//
// コマンドハンドラーが利用する永続化操作（create / get / all / save / delete）を抽象化します。
// 特定の永続化ライブラリのリフレクションAPIには依存せず、モデル記述子を明示的に受け取ります。

use crate::core::error::{RepositoryError, ValueError};
use crate::core::record::{Assignments, Record};
use crate::core::schema::{kind_label, ModelDescriptor};
use crate::core::value::FieldValue;
use async_trait::async_trait;
use chrono::NaiveDateTime;

/// モデル単位の永続化リポジトリ
///
/// 各操作はちょうど一度だけ試行され、リトライは行いません。
#[async_trait]
pub trait ModelRepository: Send + Sync {
    /// 新しいインスタンスを作成して永続化
    ///
    /// 未指定のフィールドにはデフォルト値（なければNULL）を、
    /// auto_now / auto_now_add のタイムスタンプには現在時刻を設定します。
    async fn create(
        &self,
        model: &ModelDescriptor,
        assignments: &Assignments,
    ) -> Result<Record, RepositoryError>;

    /// 識別子でインスタンスを取得
    ///
    /// 存在しない場合は `RepositoryError::NotFound` を返します。
    async fn get(&self, model: &ModelDescriptor, id: i64) -> Result<Record, RepositoryError>;

    /// 全インスタンスを取得（取得順）
    async fn all(&self, model: &ModelDescriptor) -> Result<Vec<Record>, RepositoryError>;

    /// インスタンスの変更を永続化
    ///
    /// auto_now のタイムスタンプは保存時に更新されます。
    async fn save(
        &self,
        model: &ModelDescriptor,
        record: &Record,
    ) -> Result<Record, RepositoryError>;

    /// インスタンスを削除
    async fn delete(&self, model: &ModelDescriptor, record: &Record)
        -> Result<(), RepositoryError>;
}

/// 未検出エラーを生成
pub fn not_found(model: &ModelDescriptor, id: i64) -> RepositoryError {
    RepositoryError::NotFound {
        model: model.label(),
        id,
    }
}

/// 挿入する値を組み立てる（主キーを除く全フィールド、宣言順）
///
/// 指定値 > auto タイムスタンプ > デフォルト値 > NULL の優先順で値を決定します。
/// 未知のフィールド名や種別の合わない値は拒否します。
pub fn prepare_insert(
    model: &ModelDescriptor,
    assignments: &Assignments,
    now: NaiveDateTime,
) -> Result<Vec<(String, FieldValue)>, ValueError> {
    check_assignments(model, assignments)?;

    let mut values = Vec::with_capacity(model.fields.len());
    for field in model.fields.iter().filter(|f| !f.primary_key) {
        let supplied = assignments
            .iter()
            .find(|(name, value)| name == &field.name && !value.is_null())
            .map(|(_, value)| value.clone());

        let value = match supplied {
            Some(value) => value,
            None if field.is_auto_timestamp() => FieldValue::Timestamp(now),
            None => field.default_value()?.unwrap_or(FieldValue::Null),
        };
        values.push((field.name.clone(), value));
    }

    Ok(values)
}

/// auto_now のタイムスタンプを現在時刻に更新
pub fn touch_auto_now(
    model: &ModelDescriptor,
    record: &mut Record,
    now: NaiveDateTime,
) -> Result<(), ValueError> {
    for field in model.fields.iter().filter(|f| f.auto_now) {
        record.set(&field.name, FieldValue::Timestamp(now))?;
    }
    Ok(())
}

/// 代入のフィールド名と値の種別を検証
pub fn check_assignments(
    model: &ModelDescriptor,
    assignments: &Assignments,
) -> Result<(), ValueError> {
    for (name, value) in assignments {
        let field = model
            .get_field(name)
            .filter(|f| !f.primary_key)
            .ok_or_else(|| ValueError::UnknownField {
                field: name.clone(),
            })?;
        if !value.matches_kind(field.kind) {
            return Err(ValueError::Mismatch {
                field: name.clone(),
                expected: kind_label(field.kind),
            });
        }
    }
    Ok(())
}
