// モデルインスタンス
//
// 永続化層から取得・作成されたレコードを表現します。
// 各コマンド呼び出しが一時的に所有し、呼び出しをまたいでキャッシュされることはありません。

use crate::core::error::ValueError;
use crate::core::schema::ModelDescriptor;
use crate::core::value::FieldValue;
use serde::Serialize;

/// フィールド代入のリスト（フィールド名 -> 値、宣言順）
pub type Assignments = Vec<(String, FieldValue)>;

/// 永続化されたレコード
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// モデル名
    pub model: String,
    /// 主キー値
    pub id: i64,
    /// 全フィールドの値（モデルの宣言順、主キーを含む）
    pub values: Vec<(String, FieldValue)>,
}

impl Record {
    /// 新しいレコードを作成
    pub fn new(model: impl Into<String>, id: i64, values: Vec<(String, FieldValue)>) -> Self {
        Self {
            model: model.into(),
            id,
            values,
        }
    }

    /// フィールド値を取得
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// フィールド値を上書き
    pub fn set(&mut self, field: &str, value: FieldValue) -> Result<(), ValueError> {
        match self.values.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => {
                *slot = value;
                Ok(())
            }
            None => Err(ValueError::UnknownField {
                field: field.to_string(),
            }),
        }
    }

    /// ヌル番兵でない値だけを上書き
    ///
    /// # Returns
    ///
    /// 実際に上書きされたフィールド数
    pub fn apply(&mut self, assignments: &[(String, FieldValue)]) -> Result<usize, ValueError> {
        let mut applied = 0;
        for (field, value) in assignments {
            if value.is_null() {
                continue;
            }
            self.set(field, value.clone())?;
            applied += 1;
        }
        Ok(applied)
    }

    /// 一覧表示用の文字列
    ///
    /// display_field が設定されていればその値、なければ `<Model: id>` を返します。
    pub fn display_label(&self, model: &ModelDescriptor) -> String {
        model
            .display_field
            .as_deref()
            .and_then(|field| self.get(field))
            .map(|value| value.to_string())
            .unwrap_or_else(|| format!("<{}: {}>", self.model, self.id))
    }
}
