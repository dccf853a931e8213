pub mod server;
pub mod wire;

pub use server::serve;
pub use wire::{RpcRequest, RpcResponse};
