use anyhow::{Context, Result};
use colored::control as color_control;
use modelctl::cli::command_context::CommandContext;
use modelctl::cli::{
    build_model_root_command, builtin_request, dispatch, presentation, GlobalArgs,
};
use modelctl::core::naming::LOG_ENV;
use modelctl::core::schema::ModelDescriptor;
use modelctl::services::blocking_bridge::BlockingBridge;
use std::env;
use std::ffi::OsString;
use std::path::Path;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<OsString> = env::args_os().collect();

    // 設定ファイルとモデル定義の場所を知るためにグローバルオプションを先読み
    let globals = GlobalArgs::bootstrap(args.clone());
    init_logging(globals.verbose);

    if globals.no_color {
        color_control::set_override(false);
    }

    match run(args, globals) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// ログ出力の初期化（標準エラー出力）
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// コマンドをパースして実行し、整形済みの出力を返す
///
/// 引数のパースはモデル定義だけで行い、データベースへの接続はコマンドの実行直前に行います。
fn run(args: Vec<OsString>, bootstrap: GlobalArgs) -> Result<String> {
    let project_path = env::current_dir()?;

    let (mut context, mut models) = match load_definitions(&project_path, &bootstrap) {
        Ok(loaded) => loaded,
        Err(e) => {
            // 設定が無くても --help / --version には応答する
            if let Some(request) = builtin_request(args.clone()) {
                request.exit();
            }
            return Err(e);
        }
    };

    let mut matches = build_model_root_command(&models)?.get_matches_from(args.clone());
    let mut globals = GlobalArgs::from_matches(&matches)?;

    // モデル用フラグの後ろに書かれた --config は先読みで拾えないため読み直す
    if globals.config != bootstrap.config {
        debug!(config = ?globals.config, "Reloading with options given after the command");
        (context, models) = load_definitions(&project_path, &globals)?;
        matches = build_model_root_command(&models)?.get_matches_from(args);
        globals = GlobalArgs::from_matches(&matches)?;
    }

    if globals.no_color {
        color_control::set_override(false);
    }

    let bridge = BlockingBridge::new().context("Failed to create Tokio runtime")?;
    let apps = context.build_apps(&globals.env, models, &bridge)?;
    let output = dispatch(&apps, &matches)?;
    presentation::render(&output, globals.format)
}

/// 設定とモデル定義を読み込む（データベースには接続しない）
fn load_definitions(
    project_path: &Path,
    globals: &GlobalArgs,
) -> Result<(CommandContext, Vec<ModelDescriptor>)> {
    let context =
        CommandContext::load_with_config(project_path.to_path_buf(), globals.config.clone())?;
    let models = context.load_models()?;
    Ok((context, models))
}
