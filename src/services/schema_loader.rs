// モデル定義読み込みサービス
//
// モデルディレクトリ内のYAMLファイルを読み込み、検証済みのモデル記述子のリストを返します。
// 1ファイルにつき1モデルで、ファイル名順に読み込みます。

use crate::core::naming;
use crate::core::schema::ModelDescriptor;
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// モデル定義読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader;

impl SchemaLoader {
    /// 新しいSchemaLoaderを作成
    pub fn new() -> Self {
        Self
    }

    /// ディレクトリ内のすべてのモデル定義を読み込む
    ///
    /// # Errors
    ///
    /// - ディレクトリが存在しない場合
    /// - YAMLの解析やモデルの検証に失敗した場合
    /// - 同じコマンドグループ名になるモデルが複数ある場合
    pub fn load_directory(&self, models_dir: &Path) -> Result<Vec<ModelDescriptor>> {
        if !models_dir.is_dir() {
            bail!("Models directory not found: {}", models_dir.display());
        }

        let mut models = Vec::new();
        let mut groups = HashSet::new();

        for path in self.scan_yaml_files(models_dir)? {
            let model = self.load_file(&path)?;
            if !groups.insert(naming::group_name(&model.name)) {
                bail!(
                    "Model '{}' in {} is defined more than once",
                    model.name,
                    path.display()
                );
            }
            debug!(model = %model.name, path = %path.display(), "Loaded model");
            models.push(model);
        }

        Ok(models)
    }

    /// 単一のYAMLファイルからモデルを読み込み、検証する
    pub fn load_file(&self, path: &Path) -> Result<ModelDescriptor> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model file: {:?}", path))?;
        let model: ModelDescriptor = serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse model file: {:?}", path))?;
        model
            .validate()
            .with_context(|| format!("Invalid model definition: {:?}", path))?;
        Ok(model)
    }

    // .yaml / .yml のファイルのみ、ファイル名順
    fn scan_yaml_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read models directory: {:?}", dir))?;

        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            ) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::FieldKind;
    use tempfile::TempDir;

    const TASK_YAML: &str = r#"
name: Task
display_field: title
fields:
  - name: id
    kind: integer
    primary_key: true
  - name: title
  - name: done
    kind: boolean
    default: false
  - name: created_at
    kind: timestamp
    auto_now_add: true
"#;

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("task.yaml");
        fs::write(&path, TASK_YAML).unwrap();

        let model = SchemaLoader::new().load_file(&path).unwrap();
        assert_eq!(model.name, "Task");
        assert_eq!(model.display_field.as_deref(), Some("title"));
        assert_eq!(model.fields.len(), 4);
        assert_eq!(model.fields[1].kind, FieldKind::Text);
        assert!(model.fields[2].has_default());
    }

    #[test]
    fn test_load_directory_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b_task.yaml"), TASK_YAML).unwrap();
        fs::write(
            dir.path().join("a_note.yml"),
            "name: Note\nfields:\n  - name: id\n    kind: integer\n    primary_key: true\n",
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let models = SchemaLoader::new().load_directory(dir.path()).unwrap();
        let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Note", "Task"]);
    }

    #[test]
    fn test_invalid_model_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "name: Broken\nfields:\n  - name: title\n").unwrap();

        let err = SchemaLoader::new().load_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("exactly one primary key"));
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let result = SchemaLoader::new().load_directory(&dir.path().join("nope"));
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_model_names() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("one.yaml"), TASK_YAML).unwrap();
        fs::write(dir.path().join("two.yaml"), TASK_YAML).unwrap();

        let err = SchemaLoader::new().load_directory(dir.path()).unwrap_err();
        assert!(err.to_string().contains("defined more than once"));
    }
}
