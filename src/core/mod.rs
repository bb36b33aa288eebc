// Core Domain
// モデル記述子、フィールド値、レコード、設定、エラー型などの純粋なドメイン定義

pub mod config;
pub mod error;
pub mod naming;
pub mod record;
pub mod schema;
pub mod value;
