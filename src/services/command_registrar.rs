// コマンド登録サービス
//
// 一つのモデルに対して list / delete / show / create / edit の5コマンドを生成し、
// モデル名のコマンドグループとして登録します。
// 各ハンドラーはちょうど一つの非同期な永続化タスクを同期ブリッジで完了まで実行します。

use crate::adapters::repository::ModelRepository;
use crate::core::error::RepositoryError;
use crate::core::naming::{self, ID_PARAMETER};
use crate::core::record::{Assignments, Record};
use crate::core::schema::ModelDescriptor;
use crate::core::value::FieldValue;
use crate::services::blocking_bridge::BlockingBridge;
use crate::services::signature_synthesizer::{attach, synthesize, CommandMode, ParameterSpec};
use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use tracing::{debug, info};

/// 登録されるコマンド名（登録順）
pub const COMMAND_NAMES: [&str; 5] = ["list", "delete", "show", "create", "edit"];

/// 通知レベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// フィールド名 -> 値 の順序付きマップ（JSONではオブジェクトとして出力）
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMap(pub Vec<(String, FieldValue)>);

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// コマンドの出力
///
/// 表示層（テキストのパネル／テーブル、またはJSON）に依存しない構造化された結果です。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandOutput {
    /// 情報・警告・エラーのメッセージ
    Notice { level: NoticeLevel, message: String },
    /// 単一インスタンスの詳細
    Instance {
        model: String,
        id: i64,
        fields: FieldMap,
    },
    /// 番号付きの一覧
    Listing { title: String, rows: Vec<String> },
}

impl CommandOutput {
    /// 情報メッセージ
    pub fn info(message: impl Into<String>) -> Self {
        Self::Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// 警告メッセージ
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Notice {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    /// エラーメッセージ
    pub fn error(message: impl Into<String>) -> Self {
        Self::Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// レコードの詳細
    pub fn instance(model: &ModelDescriptor, record: &Record) -> Self {
        Self::Instance {
            model: model.label(),
            id: record.id,
            fields: FieldMap(record.values.clone()),
        }
    }

    /// 装飾なしの本文
    ///
    /// 詳細は `* field: value` を改行で連結したものになります。
    pub fn body(&self) -> String {
        match self {
            CommandOutput::Notice { message, .. } => message.clone(),
            CommandOutput::Instance { fields, .. } => fields
                .0
                .iter()
                .map(|(name, value)| format!("* {}: {}", name, value))
                .collect::<Vec<_>>()
                .join("\n"),
            CommandOutput::Listing { rows, .. } => rows
                .iter()
                .enumerate()
                .map(|(i, row)| format!("{} {}", i + 1, row))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// 通知レベル（詳細は情報扱い、一覧はなし）
    pub fn level(&self) -> Option<NoticeLevel> {
        match self {
            CommandOutput::Notice { level, .. } => Some(*level),
            CommandOutput::Instance { .. } => Some(NoticeLevel::Info),
            CommandOutput::Listing { .. } => None,
        }
    }
}

/// コマンド仕様
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub help: String,
    pub parameters: Vec<ParameterSpec>,
}

/// モデルの5コマンドの仕様を生成
pub fn command_specs(model: &ModelDescriptor) -> Vec<CommandSpec> {
    let label = model.label();
    vec![
        CommandSpec {
            name: "list",
            help: format!("List all {} instances.", label),
            parameters: Vec::new(),
        },
        CommandSpec {
            name: "delete",
            help: format!("Delete a specific {} instance.", label),
            parameters: vec![ParameterSpec::identifier()],
        },
        CommandSpec {
            name: "show",
            help: format!("Show a specific {} instance.", label),
            parameters: vec![ParameterSpec::identifier()],
        },
        CommandSpec {
            name: "create",
            help: format!("Create a new {} instance.", label),
            parameters: synthesize(model, CommandMode::Create),
        },
        CommandSpec {
            name: "edit",
            help: format!("Edit an existing {} instance.", label),
            parameters: synthesize(model, CommandMode::Edit),
        },
    ]
}

/// コマンドグループを構築
pub fn build_group(model: &ModelDescriptor) -> Command {
    command_specs(model).into_iter().fold(
        Command::new(naming::group_name(&model.name))
            .about(format!("Manage {} instances.", model.label()))
            .subcommand_required(true)
            .arg_required_else_help(true),
        |group, spec| group.subcommand(attach(Command::new(spec.name).about(spec.help), &spec.parameters)),
    )
}

/// モデル単位のコマンドハンドラー群
pub struct ModelCommands {
    model: ModelDescriptor,
    repository: Arc<dyn ModelRepository>,
    bridge: BlockingBridge,
    create_parameters: Vec<ParameterSpec>,
    edit_parameters: Vec<ParameterSpec>,
}

impl std::fmt::Debug for ModelCommands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCommands")
            .field("model", &self.model.name)
            .finish()
    }
}

impl ModelCommands {
    /// 新しいModelCommandsを作成
    ///
    /// モデル記述子は事前に検証済みであることを前提とします。
    pub fn new(
        model: ModelDescriptor,
        repository: Arc<dyn ModelRepository>,
        bridge: BlockingBridge,
    ) -> Self {
        let create_parameters = synthesize(&model, CommandMode::Create);
        let edit_parameters = synthesize(&model, CommandMode::Edit);
        Self {
            model,
            repository,
            bridge,
            create_parameters,
            edit_parameters,
        }
    }

    /// 管理対象のモデル
    pub fn model(&self) -> &ModelDescriptor {
        &self.model
    }

    /// 全インスタンスを一覧表示
    pub fn list(&self) -> Result<CommandOutput, RepositoryError> {
        debug!(model = %self.model.name, "list");
        let records = self.bridge.run(self.repository.all(&self.model))?;

        if records.is_empty() {
            return Ok(CommandOutput::warning(format!(
                "No {} instances found.",
                self.model.label()
            )));
        }

        Ok(CommandOutput::Listing {
            title: self.model.label(),
            rows: records
                .iter()
                .map(|record| record.display_label(&self.model))
                .collect(),
        })
    }

    /// 指定されたインスタンスを表示
    pub fn show(&self, id: i64) -> Result<CommandOutput, RepositoryError> {
        debug!(model = %self.model.name, id, "show");
        let result = self.bridge.run(self.repository.get(&self.model, id));
        self.report(result, |record| CommandOutput::instance(&self.model, &record))
    }

    /// 新しいインスタンスを作成して表示
    pub fn create(&self, assignments: Assignments) -> Result<CommandOutput, RepositoryError> {
        debug!(model = %self.model.name, fields = assignments.len(), "create");
        let record = self
            .bridge
            .run(self.repository.create(&self.model, &assignments))?;
        info!(model = %self.model.name, id = record.id, "Created instance");
        Ok(CommandOutput::instance(&self.model, &record))
    }

    /// 既存のインスタンスを編集して表示
    ///
    /// ヌル番兵の値は「変更しない」として扱われます。
    pub fn edit(&self, id: i64, assignments: Assignments) -> Result<CommandOutput, RepositoryError> {
        debug!(model = %self.model.name, id, fields = assignments.len(), "edit");
        let result = self.bridge.run(async {
            let mut record = self.repository.get(&self.model, id).await?;
            record.apply(&assignments)?;
            self.repository.save(&self.model, &record).await
        });
        self.report(result, |record| CommandOutput::instance(&self.model, &record))
    }

    /// 指定されたインスタンスを削除
    pub fn delete(&self, id: i64) -> Result<CommandOutput, RepositoryError> {
        debug!(model = %self.model.name, id, "delete");
        let result = self.bridge.run(async {
            let record = self.repository.get(&self.model, id).await?;
            self.repository.delete(&self.model, &record).await
        });
        self.report(result, |()| {
            info!(model = %self.model.name, id, "Deleted instance");
            CommandOutput::info(format!(
                "{} with ID {} deleted successfully.",
                self.model.label(),
                id
            ))
        })
    }

    /// 未検出エラーをエラーメッセージに変換し、それ以外のエラーは呼び出し元へ伝播
    fn report<T>(
        &self,
        result: Result<T, RepositoryError>,
        on_success: impl FnOnce(T) -> CommandOutput,
    ) -> Result<CommandOutput, RepositoryError> {
        match result {
            Ok(value) => Ok(on_success(value)),
            Err(e @ RepositoryError::NotFound { .. }) => Ok(CommandOutput::error(e.to_string())),
            Err(e) => Err(e),
        }
    }

    /// パース済みの引数からコマンドを実行
    pub fn dispatch(&self, matches: &ArgMatches) -> Result<CommandOutput> {
        let (name, sub) = matches
            .subcommand()
            .ok_or_else(|| anyhow!("No command given for {}", self.model.label()))?;

        let output = match name {
            "list" => self.list()?,
            "show" => self.show(identifier(sub)?)?,
            "delete" => self.delete(identifier(sub)?)?,
            "create" => self.create(collect_assignments(sub, &self.create_parameters))?,
            "edit" => self.edit(
                identifier(sub)?,
                collect_assignments(sub, &self.edit_parameters),
            )?,
            other => return Err(anyhow!("Unknown command: {}", other)),
        };
        Ok(output)
    }
}

/// 識別子引数を取得
fn identifier(matches: &ArgMatches) -> Result<i64> {
    matches
        .get_one::<FieldValue>(ID_PARAMETER)
        .and_then(FieldValue::as_integer)
        .ok_or_else(|| anyhow!("Missing required argument: {}", ID_PARAMETER))
}

/// 指定されたフィールド引数だけを代入リストに集める（識別子は除く）
fn collect_assignments(matches: &ArgMatches, parameters: &[ParameterSpec]) -> Assignments {
    parameters
        .iter()
        .filter(|p| p.name != ID_PARAMETER)
        .filter_map(|p| {
            matches
                .get_one::<FieldValue>(&p.name)
                .map(|value| (p.name.clone(), value.clone()))
        })
        .collect()
}
