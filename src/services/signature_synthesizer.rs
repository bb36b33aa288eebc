// シグネチャ合成サービス
//
// モデルのフィールド定義とモード（作成／編集）から、コマンドの引数リストを宣言的に合成します。
// 合成した ParameterSpec のリストを clap::Command に取り付けることで、
// パーサーが引数の文法を導出できるようにします。

use crate::core::naming::ID_PARAMETER;
use crate::core::schema::ModelDescriptor;
use crate::services::field_type_mapper::{map_field_type, CliType};
use clap::{Arg, ArgAction, Command};

/// 合成モード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMode {
    /// 作成（必須性はフィールドの制約に従う）
    Create,
    /// 編集（識別子を先頭に追加し、全フィールドを任意にする）
    Edit,
}

/// 引数の配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// 位置引数（識別子）
    Positional,
    /// `--name VALUE` 形式のフラグ
    Flag,
}

/// 生成された引数仕様
///
/// 登録時に一度だけ作成され、コマンドに取り付けた後は変更されません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub cli_type: CliType,
    pub required: bool,
    pub placement: Placement,
    pub help: Option<String>,
}

impl ParameterSpec {
    /// 識別子パラメータ（必須、整数、位置引数）
    pub fn identifier() -> Self {
        Self {
            name: ID_PARAMETER.to_string(),
            cli_type: CliType::Integer,
            required: true,
            placement: Placement::Positional,
            help: Some("ID of the instance".to_string()),
        }
    }

    /// clap引数に変換
    pub fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name.clone())
            .value_name(self.cli_type.value_name())
            .value_parser(self.cli_type.value_parser())
            .action(ArgAction::Set)
            .required(self.required);

        if self.placement == Placement::Flag {
            arg = arg.long(self.name.clone());
        }
        if let Some(help) = &self.help {
            arg = arg.help(help.clone());
        }
        arg
    }
}

/// モデルとモードから引数リストを合成
///
/// 1. 編集モードでは識別子 `id` を先頭に追加
/// 2. 宣言順にフィールドを走査し、主キーと auto_now / auto_now_add のタイムスタンプを除外
/// 3. 作成モードかつ NULL 不可かつデフォルトなしの場合のみ必須
pub fn synthesize(model: &ModelDescriptor, mode: CommandMode) -> Vec<ParameterSpec> {
    let mut parameters = Vec::with_capacity(model.fields.len() + 1);

    if mode == CommandMode::Edit {
        parameters.push(ParameterSpec::identifier());
    }

    for field in &model.fields {
        if field.is_system_managed() {
            continue;
        }

        let required = !field.nullable && !field.has_default() && mode == CommandMode::Create;

        parameters.push(ParameterSpec {
            name: field.name.clone(),
            cli_type: map_field_type(field),
            required,
            placement: Placement::Flag,
            help: field.help.clone(),
        });
    }

    parameters
}

/// 引数リストをコマンドに取り付ける
pub fn attach(command: Command, parameters: &[ParameterSpec]) -> Command {
    parameters
        .iter()
        .fold(command, |command, parameter| command.arg(parameter.to_arg()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{DefaultValue, FieldDescriptor, FieldKind};
    use crate::core::value::FieldValue;

    fn task_model() -> ModelDescriptor {
        ModelDescriptor::new("Task")
            .field(FieldDescriptor::primary_key("id"))
            .field(FieldDescriptor::new("title", FieldKind::Text))
            .field(
                FieldDescriptor::new("done", FieldKind::Boolean)
                    .with_default(DefaultValue::Boolean(false)),
            )
            .field(FieldDescriptor::new("due", FieldKind::Date).nullable())
            .field(FieldDescriptor::new("created_at", FieldKind::Timestamp).auto_now_add())
            .field(FieldDescriptor::new("updated_at", FieldKind::Timestamp).auto_now())
            .field(FieldDescriptor::new("reminder", FieldKind::Timestamp))
    }

    fn names(parameters: &[ParameterSpec]) -> Vec<&str> {
        parameters.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_create_skips_system_managed_fields() {
        let parameters = synthesize(&task_model(), CommandMode::Create);
        assert_eq!(names(&parameters), vec!["title", "done", "due", "reminder"]);
    }

    #[test]
    fn test_create_requiredness() {
        let parameters = synthesize(&task_model(), CommandMode::Create);
        let required: Vec<(&str, bool)> = parameters
            .iter()
            .map(|p| (p.name.as_str(), p.required))
            .collect();

        assert_eq!(
            required,
            vec![
                ("title", true),
                ("done", false),
                ("due", false),
                ("reminder", true)
            ]
        );
    }

    #[test]
    fn test_edit_prepends_identifier_and_forces_optional() {
        let parameters = synthesize(&task_model(), CommandMode::Edit);

        assert_eq!(parameters[0], ParameterSpec::identifier());
        assert_eq!(parameters[0].placement, Placement::Positional);
        assert!(parameters[1..].iter().all(|p| !p.required));
        assert_eq!(
            names(&parameters),
            vec!["id", "title", "done", "due", "reminder"]
        );
    }

    #[test]
    fn test_types_follow_mapper() {
        let parameters = synthesize(&task_model(), CommandMode::Create);
        let types: Vec<CliType> = parameters.iter().map(|p| p.cli_type).collect();
        assert_eq!(
            types,
            vec![
                CliType::Text,
                CliType::Boolean,
                CliType::Date,
                CliType::Timestamp
            ]
        );
    }

    #[test]
    fn test_attach_builds_grammar() {
        let command = attach(
            Command::new("create").no_binary_name(true),
            &synthesize(&task_model(), CommandMode::Create),
        );

        let err = command
            .clone()
            .try_get_matches_from(["--done", "true"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let matches = command
            .try_get_matches_from(["--title", "buy milk", "--reminder", "2024-01-01"])
            .unwrap();
        assert_eq!(
            matches.get_one::<FieldValue>("title"),
            Some(&FieldValue::Text("buy milk".to_string()))
        );
        assert!(matches.get_one::<FieldValue>("done").is_none());
    }

    #[test]
    fn test_attach_identifier_is_positional() {
        let command = attach(
            Command::new("edit").no_binary_name(true),
            &synthesize(&task_model(), CommandMode::Edit),
        );

        let matches = command.try_get_matches_from(["5", "--done", "yes"]).unwrap();
        assert_eq!(
            matches.get_one::<FieldValue>("id"),
            Some(&FieldValue::Integer(5))
        );
        assert_eq!(
            matches.get_one::<FieldValue>("done"),
            Some(&FieldValue::Boolean(true))
        );
    }
}
