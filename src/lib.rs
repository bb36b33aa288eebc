// modelctlライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（コマンドグループの登録、ルーティング、出力整形）
// - core: コアドメイン（モデル記述子、フィールド値、レコード、設定、エラー）
// - adapters: 永続化クライアント（SQLリポジトリ、インメモリリポジトリ、接続管理）
// - services: モデル定義からコマンドを合成・実行するサービス

pub mod adapters;
pub mod cli;
pub mod core;
pub mod services;
