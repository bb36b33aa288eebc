// 命名ポリシー
//
// アプリケーション名と関連パスの単一ソースを提供します。

/// 現行アプリケーション名
pub const APP_NAME: &str = "modelctl";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".modelctl.yaml";

/// 既定のモデル定義ディレクトリ
pub const MODELS_DIR: &str = "models";

/// ログレベル上書き用の環境変数名
pub const LOG_ENV: &str = "MODELCTL_LOG";

/// 識別子パラメータ名
///
/// edit / show / delete の位置引数として使われ、主キーにマッピングされます。
pub const ID_PARAMETER: &str = "id";

/// フィールドのフラグ名として使えない名前（識別子とグローバルオプション）
pub const RESERVED_NAMES: [&str; 7] = [ID_PARAMETER, "help", "version", "config", "env", "verbose", "format"];

/// 予約名か
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// モデル名をコマンドグループ名に変換（小文字化）
pub fn group_name(model_name: &str) -> String {
    model_name.to_lowercase()
}

/// モデル名を表示用ラベルに変換（大文字化）
pub fn display_label(model_name: &str) -> String {
    model_name.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_name_is_lowercase() {
        assert_eq!(group_name("TodoItem"), "todoitem");
    }

    #[test]
    fn test_display_label_is_uppercase() {
        assert_eq!(display_label("Task"), "TASK");
    }

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved("id"));
        assert!(is_reserved("format"));
        assert!(!is_reserved("title"));
    }
}
