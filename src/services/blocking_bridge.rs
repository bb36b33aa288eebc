// 同期ブリッジ
//
// コマンドハンドラーは呼び出し側から見て同期的に動作し、内部で一つの非同期タスクを
// 完了まで実行してから戻ります。接続プールは作成したランタイムに結び付くため、
// 接続の確立とコマンドの実行は同じランタイムで行います。

use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

/// 非同期タスクを完了まで実行するブリッジ
#[derive(Debug, Clone)]
pub struct BlockingBridge {
    runtime: Arc<Runtime>,
}

impl BlockingBridge {
    /// シングルスレッドのランタイムを新規作成
    pub fn new() -> io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self::from_runtime(Arc::new(runtime)))
    }

    /// 既存のランタイムを共有
    pub fn from_runtime(runtime: Arc<Runtime>) -> Self {
        Self { runtime }
    }

    /// ランタイムを取得
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// 非同期タスクを完了まで実行
    ///
    /// 非同期コンテキスト内から呼び出すとパニックします。
    pub fn run<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
