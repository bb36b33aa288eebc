/// CLI エントリーポイントのテスト
///
/// モデル定義から構築されたコマンドツリーが正しく定義され、
/// 各サブコマンドとオプションが期待通りにパースされることを確認します。

#[cfg(test)]
mod cli_tests {
    use clap::error::ErrorKind;
    use modelctl::adapters::memory_repository::MemoryRepository;
    use modelctl::cli::{build_root_command, dispatch, GlobalArgs, ModelApp, OutputFormat};
    use modelctl::core::schema::{DefaultValue, FieldDescriptor, FieldKind, ModelDescriptor};
    use modelctl::core::value::FieldValue;
    use modelctl::services::blocking_bridge::BlockingBridge;
    use std::sync::Arc;

    fn task_model() -> ModelDescriptor {
        ModelDescriptor::new("Task")
            .field(FieldDescriptor::primary_key("id"))
            .field(FieldDescriptor::new("title", FieldKind::Text).with_help("Short summary"))
            .field(
                FieldDescriptor::new("done", FieldKind::Boolean)
                    .with_default(DefaultValue::Boolean(false)),
            )
            .field(FieldDescriptor::new("created_at", FieldKind::Timestamp).auto_now_add())
    }

    fn note_model() -> ModelDescriptor {
        ModelDescriptor::new("Note")
            .field(FieldDescriptor::primary_key("id"))
            .field(FieldDescriptor::new("body", FieldKind::Text).nullable())
    }

    fn apps() -> Vec<ModelApp> {
        let repository = Arc::new(MemoryRepository::new());
        let bridge = BlockingBridge::new().unwrap();
        vec![
            ModelApp::new(task_model(), repository.clone(), bridge.clone()).unwrap(),
            ModelApp::new(note_model(), repository, bridge).unwrap(),
        ]
    }

    /// ルートコマンドの定義がclapの検証を通ることを確認
    #[test]
    fn test_root_command_debug_assert() {
        build_root_command(&apps()).debug_assert();
    }

    /// ヘルプとバージョンはエラー（表示して終了）として扱われる
    #[test]
    fn test_help_and_version() {
        let err = build_root_command(&apps())
            .try_get_matches_from(["modelctl", "--help"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);

        let err = build_root_command(&apps())
            .try_get_matches_from(["modelctl", "--version"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    /// モデルごとにグループが登録され、各グループに5つのコマンドがある
    #[test]
    fn test_groups_registered_per_model() {
        let root = build_root_command(&apps());
        let groups: Vec<&str> = root.get_subcommands().map(|c| c.get_name()).collect();
        assert_eq!(groups, vec!["task", "note"]);

        let task = root.find_subcommand("task").unwrap();
        assert_eq!(
            task.get_about().map(|s| s.to_string()),
            Some("Manage TASK instances.".to_string())
        );
        let commands: Vec<&str> = task.get_subcommands().map(|c| c.get_name()).collect();
        assert_eq!(commands, vec!["list", "delete", "show", "create", "edit"]);
    }

    /// createで必須フラグが欠けているとclapが使用法エラーを返す
    #[test]
    fn test_create_without_required_flag_is_usage_error() {
        let err = build_root_command(&apps())
            .try_get_matches_from(["modelctl", "task", "create"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(err.to_string().contains("--title"));
    }

    /// 自動タイムスタンプのフィールドはフラグにならない
    #[test]
    fn test_auto_timestamp_has_no_flag() {
        let err = build_root_command(&apps())
            .try_get_matches_from([
                "modelctl",
                "task",
                "create",
                "--title",
                "x",
                "--created_at",
                "2024-01-01",
            ])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    /// 型に合わない値は値検証エラーになる
    #[test]
    fn test_invalid_value_is_rejected() {
        let err = build_root_command(&apps())
            .try_get_matches_from(["modelctl", "task", "show", "abc"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);

        let err = build_root_command(&apps())
            .try_get_matches_from(["modelctl", "task", "edit", "1", "--done", "perhaps"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    /// editの識別子は位置引数で、フラグはすべて任意
    #[test]
    fn test_edit_parses_identifier_and_flags() {
        let matches = build_root_command(&apps())
            .try_get_matches_from(["modelctl", "task", "edit", "1", "--done", "true"])
            .unwrap();
        let (_, task) = matches.subcommand().unwrap();
        let (name, edit) = task.subcommand().unwrap();

        assert_eq!(name, "edit");
        assert_eq!(edit.get_one::<FieldValue>("id"), Some(&FieldValue::Integer(1)));
        assert_eq!(
            edit.get_one::<FieldValue>("done"),
            Some(&FieldValue::Boolean(true))
        );
        assert!(edit.get_one::<FieldValue>("title").is_none());
    }

    /// グローバルオプションはどの位置にも書ける
    #[test]
    fn test_global_options() {
        let matches = build_root_command(&apps())
            .try_get_matches_from([
                "modelctl", "-v", "--no-color", "note", "list", "--format", "json",
            ])
            .unwrap();
        let globals = GlobalArgs::from_matches(&matches).unwrap();

        assert!(globals.verbose);
        assert!(globals.no_color);
        assert_eq!(globals.format, OutputFormat::Json);
        assert_eq!(globals.env, "development");
    }

    /// ルートのパース結果が該当モデルへ振り分けられる
    #[test]
    fn test_dispatch_routes_to_model() {
        let apps = apps();
        let matches = build_root_command(&apps)
            .try_get_matches_from(["modelctl", "note", "create", "--body", "hello"])
            .unwrap();

        let output = dispatch(&apps, &matches).unwrap();
        assert_eq!(output.body(), "* id: 1\n* body: hello");
    }
}
