// Adapters
// データベースアクセスと永続化クライアントの実装

pub mod connection_string;
pub mod database;
pub mod memory_repository;
pub mod repository;
pub mod sql_repository;
pub mod type_mapping;
