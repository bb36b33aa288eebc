// Services Layer
// モデル定義からコマンドを組み立て、実行するサービス層

pub mod blocking_bridge;
pub mod command_registrar;
pub mod config_loader;
pub mod database_config_resolver;
pub mod field_type_mapper;
pub mod schema_loader;
pub mod signature_synthesizer;
