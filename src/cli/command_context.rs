// コマンド共通コンテキスト
//
// 設定ファイル読み込み、モデル定義の読み込み、データベース接続をCLI層で集約する。

use crate::adapters::database::DatabaseConnectionService;
use crate::adapters::repository::ModelRepository;
use crate::adapters::sql_repository::SqlRepository;
use crate::cli::ModelApp;
use crate::core::config::{Config, DatabaseConfig, Dialect};
use crate::core::schema::ModelDescriptor;
use crate::services::blocking_bridge::BlockingBridge;
use crate::services::config_loader::ConfigLoader;
use crate::services::database_config_resolver::DatabaseConfigResolver;
use crate::services::schema_loader::SchemaLoader;
use anyhow::{anyhow, Context, Result};
use sqlx::AnyPool;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// プロジェクトルートから設定を読み込んでコンテキストを作成
    pub fn load(project_path: PathBuf) -> Result<Self> {
        Self::load_with_config(project_path, None)
    }

    /// カスタム設定ファイルパスを指定してコンテキストを作成
    pub fn load_with_config(
        project_path: PathBuf,
        custom_config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let config_path = custom_config_path
            .unwrap_or_else(|| project_path.join(Config::DEFAULT_CONFIG_PATH));

        if !config_path.exists() {
            return Err(anyhow!(
                "Config file not found: {:?}. Create {} or pass --config.",
                config_path,
                Config::DEFAULT_CONFIG_PATH
            ));
        }

        let config =
            ConfigLoader::from_file(&config_path).with_context(|| "Failed to read config file")?;
        debug!(path = ?config_path, dialect = %config.dialect, "Loaded config");

        Ok(Self {
            project_path,
            config_path,
            config,
        })
    }

    /// モデル定義ディレクトリの絶対パス
    pub fn models_dir(&self) -> PathBuf {
        self.project_path.join(&self.config.models_dir)
    }

    /// モデル定義をすべて読み込む
    pub fn load_models(&self) -> Result<Vec<ModelDescriptor>> {
        SchemaLoader::new()
            .load_directory(&self.models_dir())
            .with_context(|| "Failed to load model definitions")
    }

    /// 環境に応じたデータベース設定を取得（環境変数上書き込み）
    pub fn database_config(&self, env: &str) -> Result<DatabaseConfig> {
        let config = self
            .config
            .get_database_config(env)
            .with_context(|| format!("Config for environment '{}' not found", env))?;
        Ok(DatabaseConfigResolver::apply_env_overrides(&config))
    }

    /// データベース方言を取得
    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// 接続プールを作成
    pub async fn connect_pool(&self, env: &str) -> Result<AnyPool> {
        let db_config = self.database_config(env)?;
        let db_service = DatabaseConnectionService::new();
        let pool = db_service
            .create_pool(self.config.dialect, &db_config)
            .await
            .with_context(|| "Failed to connect to database")?;
        db_service.test_connection(&pool).await?;
        Ok(pool)
    }

    /// リポジトリを作成し、必要に応じてテーブルを作成
    pub async fn connect_repository(
        &self,
        env: &str,
        models: &[ModelDescriptor],
    ) -> Result<SqlRepository> {
        let pool = self.connect_pool(env).await?;
        let repository = SqlRepository::new(pool, self.config.dialect);

        if self.config.generate_schemas {
            for model in models {
                repository.ensure_table(model).await?;
            }
            info!(count = models.len(), "Generated schemas");
        }

        Ok(repository)
    }

    /// 読み込み済みのモデル定義からモデルごとのアプリを構築
    ///
    /// ここで初めてデータベースに接続します。
    /// 接続プールはブリッジのランタイム上で作成され、コマンドの実行も同じランタイムで行われます。
    pub fn build_apps(
        &self,
        env: &str,
        models: Vec<ModelDescriptor>,
        bridge: &BlockingBridge,
    ) -> Result<Vec<ModelApp>> {
        let repository: Arc<dyn ModelRepository> =
            Arc::new(bridge.run(self.connect_repository(env, &models))?);

        models
            .into_iter()
            .map(|model| {
                ModelApp::new(model, repository.clone(), bridge.clone()).map_err(anyhow::Error::from)
            })
            .collect()
    }
}
