// データベース接続アダプター
//
// SQLxを使用したデータベース接続の管理を行います。
// PostgreSQL、MySQL、SQLiteに対応した統一されたインターフェースを提供します。

use crate::adapters::connection_string;
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::RepositoryError;
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool};
use std::time::Duration;
use tracing::debug;

/// データベース接続サービス
///
/// データベース接続プールの初期化と管理を行います。
#[derive(Debug, Clone, Default)]
pub struct DatabaseConnectionService {}

impl DatabaseConnectionService {
    /// 新しいDatabaseConnectionServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// データベース接続文字列を構築
    pub fn build_connection_string(&self, dialect: Dialect, config: &DatabaseConfig) -> String {
        connection_string::build_connection_string(dialect, config)
    }

    /// データベース接続プールを作成
    ///
    /// # Arguments
    ///
    /// * `dialect` - データベース方言
    /// * `config` - データベース設定
    ///
    /// # Returns
    ///
    /// 接続プールまたはエラー
    pub async fn create_pool(
        &self,
        dialect: Dialect,
        config: &DatabaseConfig,
    ) -> Result<AnyPool, RepositoryError> {
        sqlx::any::install_default_drivers();

        let connection_string = self.build_connection_string(dialect, config);
        debug!(%dialect, database = %config.database, "Connecting to database");

        let pool_options = self.create_pool_options_from_config(dialect, config);

        pool_options
            .connect(&connection_string)
            .await
            .map_err(|e| RepositoryError::Connection {
                message: format!("Failed to create database connection pool: {}", dialect),
                cause: e.to_string(),
            })
    }

    /// DatabaseConfigからプールオプションを作成
    ///
    /// 未設定の場合はデフォルト値（max_connections=5, timeout=30秒）を使用します。
    /// SQLiteのインメモリデータベースは接続ごとに別のDBになるため、単一接続に固定します。
    pub fn create_pool_options_from_config(
        &self,
        dialect: Dialect,
        config: &DatabaseConfig,
    ) -> PoolOptions<Any> {
        let timeout = config.timeout.unwrap_or(30);

        if dialect == Dialect::SQLite && config.database == ":memory:" {
            return PoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .acquire_timeout(Duration::from_secs(timeout));
        }

        let mut opts = PoolOptions::new()
            .max_connections(config.max_connections.unwrap_or(5))
            .acquire_timeout(Duration::from_secs(timeout));

        if let Some(min_conn) = config.min_connections {
            opts = opts.min_connections(min_conn);
        }

        if let Some(idle_secs) = config.idle_timeout {
            opts = opts.idle_timeout(Duration::from_secs(idle_secs));
        }

        opts
    }

    /// 接続テストを実行
    pub async fn test_connection(&self, pool: &AnyPool) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map(|_| ())
            .map_err(|e| RepositoryError::Connection {
                message: "Database connection test failed".to_string(),
                cause: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_pool_options_from_config_memory() {
        let service = DatabaseConnectionService::new();
        let config = DatabaseConfig {
            database: ":memory:".to_string(),
            ..Default::default()
        };
        let pool_options = service.create_pool_options_from_config(Dialect::SQLite, &config);

        assert_eq!(pool_options.get_max_connections(), 1);
    }

    #[test]
    fn test_create_pool_options_from_config_custom() {
        let service = DatabaseConnectionService::new();
        let config = DatabaseConfig {
            database: "test".to_string(),
            max_connections: Some(20),
            min_connections: Some(2),
            idle_timeout: Some(300),
            ..Default::default()
        };
        let pool_options = service.create_pool_options_from_config(Dialect::PostgreSQL, &config);

        assert_eq!(pool_options.get_max_connections(), 20);
        assert_eq!(pool_options.get_min_connections(), 2);
    }

    #[tokio::test]
    async fn test_sqlite_memory_pool_connects() {
        let service = DatabaseConnectionService::new();
        let config = DatabaseConfig {
            database: ":memory:".to_string(),
            ..Default::default()
        };

        let pool = service.create_pool(Dialect::SQLite, &config).await.unwrap();
        assert!(service.test_connection(&pool).await.is_ok());
    }
}
