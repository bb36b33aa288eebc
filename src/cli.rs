// CLI Layer
// モデルごとのコマンドグループを登録し、ユーザー入力をハンドラーへルーティングする

pub mod command_context;
pub mod presentation;

use crate::adapters::repository::ModelRepository;
use crate::core::error::SchemaError;
use crate::core::naming::APP_NAME;
use crate::core::schema::ModelDescriptor;
use crate::services::blocking_bridge::BlockingBridge;
use crate::services::command_registrar::{build_group, CommandOutput, ModelCommands};
use anyhow::{anyhow, Result};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, Args, Command, FromArgMatches, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

/// 既定の環境名
pub const DEFAULT_ENV: &str = "development";

/// 出力フォーマット
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// 全コマンド共通のグローバルオプション
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Target environment (development, staging, production)
    #[arg(
        short,
        long,
        global = true,
        value_name = "ENV",
        default_value = DEFAULT_ENV
    )]
    pub env: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl GlobalArgs {
    /// パース済みの引数からグローバルオプションを取り出す
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, clap::Error> {
        <Self as FromArgMatches>::from_arg_matches(matches)
    }

    /// モデル定義を読み込む前にグローバルオプションだけを先読みする
    ///
    /// コマンドグループは設定ファイルとモデル定義から構築されるため、
    /// 設定ファイルのパスと環境名を先に知る必要があります。
    /// 未知の引数に到達した時点で先読みは打ち切られ、それ以降のオプションは既定値になります。
    pub fn bootstrap<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let command = Self::augment_args(
            Command::new(APP_NAME)
                .ignore_errors(true)
                .disable_help_flag(true)
                .disable_version_flag(true)
                .arg(Arg::new("rest").num_args(0..).action(ArgAction::Append)),
        );
        let matches = command.get_matches_from(args);

        Self::from_matches(&matches).unwrap_or_else(|_| Self {
            config: matches.get_one::<PathBuf>("config").cloned(),
            env: matches
                .get_one::<String>("env")
                .cloned()
                .unwrap_or_else(|| DEFAULT_ENV.to_string()),
            verbose: matches.get_one::<bool>("verbose").copied().unwrap_or(false),
            no_color: matches.get_one::<bool>("no_color").copied().unwrap_or(false),
            format: matches
                .get_one::<OutputFormat>("format")
                .copied()
                .unwrap_or_default(),
        })
    }
}

/// 一つのモデルに対するCLIアプリ
///
/// モデル記述子を検証してからコマンドグループを一度だけ構築します。
#[derive(Debug)]
pub struct ModelApp {
    command: Command,
    commands: ModelCommands,
}

impl ModelApp {
    /// 新しいModelAppを作成
    ///
    /// # Errors
    ///
    /// モデル記述子が不正な場合は `SchemaError` を返します。
    pub fn new(
        model: ModelDescriptor,
        repository: Arc<dyn ModelRepository>,
        bridge: BlockingBridge,
    ) -> Result<Self, SchemaError> {
        model.validate()?;
        let command = build_group(&model);
        Ok(Self {
            command,
            commands: ModelCommands::new(model, repository, bridge),
        })
    }

    /// 管理対象のモデル
    pub fn model(&self) -> &ModelDescriptor {
        self.commands.model()
    }

    /// コマンドグループ名
    pub fn name(&self) -> &str {
        self.command.get_name()
    }

    /// clapのコマンドグループ
    pub fn command(&self) -> Command {
        self.command.clone()
    }

    /// グループ配下のパース済み引数から一回の呼び出しを実行
    pub fn run(&self, matches: &ArgMatches) -> Result<CommandOutput> {
        self.commands.dispatch(matches)
    }

    /// 引数をパースして実行
    ///
    /// 先頭要素はグループ名（`task` など）として扱われます。
    pub fn try_run_from<I, T>(&self, args: I) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command().try_get_matches_from(args)?;
        self.run(&matches)
    }
}

/// ルートコマンドを構築
pub fn build_root_command(apps: &[ModelApp]) -> Command {
    root_command(apps.iter().map(ModelApp::command))
}

/// モデル記述子からルートコマンドを構築
///
/// データベースには接続しないため、ヘルプ表示や引数エラーの検出は接続前に行えます。
///
/// # Errors
///
/// モデル記述子が不正な場合は `SchemaError` を返します。
pub fn build_model_root_command(models: &[ModelDescriptor]) -> Result<Command, SchemaError> {
    let groups = models
        .iter()
        .map(|model| -> Result<Command, SchemaError> {
            model.validate()?;
            Ok(build_group(model))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(root_command(groups))
}

/// 設定を読み込めない場合でも応答すべき `--help` / `--version` の要求を検出
///
/// 該当する場合は表示用のclapエラーを返します。
pub fn builtin_request<I, T>(args: I) -> Option<clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match root_command(Vec::new()).try_get_matches_from(args) {
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) =>
        {
            Some(e)
        }
        _ => None,
    }
}

fn root_command(groups: impl IntoIterator<Item = Command>) -> Command {
    let root = Command::new(APP_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Manage model instances from the command line")
        .long_about(
            "modelctl - CRUD commands generated from model definitions

Each model defined under the models directory gets its own command group
with list, show, create, edit and delete subcommands.",
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .after_help("For detailed help on each model, use: modelctl <model> --help");

    GlobalArgs::augment_args(root).subcommands(groups)
}

/// ルートのパース結果を該当するモデルへ振り分けて実行
pub fn dispatch(apps: &[ModelApp], matches: &ArgMatches) -> Result<CommandOutput> {
    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("No model given"))?;

    let app = apps
        .iter()
        .find(|app| app.name() == name)
        .ok_or_else(|| anyhow!("Unknown model: {}", name))?;

    app.run(sub)
}
