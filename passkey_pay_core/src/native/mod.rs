// Native implementations

pub mod account_watch;
pub mod portal;
pub mod rpc_impl;
pub mod wallet_impl;

pub use portal::PortalSender;
pub use rpc_impl::NativeRpcClient;
pub use wallet_impl::KeypairWallet;
