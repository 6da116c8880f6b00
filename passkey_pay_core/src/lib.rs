// Passkey Pay Core Library
// Platform-agnostic transfer orchestration and balance reconciliation

pub mod balance_service;
pub mod chunking;
pub mod classify;
pub mod error;
pub mod models;
pub mod rpc_client;
pub mod settings;
pub mod transfer_service;
pub mod wallet;

#[cfg(feature = "native")]
pub mod native;

// Re-exports
pub use balance_service::*;
pub use chunking::plan_chunks;
pub use classify::*;
pub use error::CoreError;
pub use models::*;
pub use rpc_client::*;
pub use settings::Settings;
pub use transfer_service::*;
pub use wallet::*;
