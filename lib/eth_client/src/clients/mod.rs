//! Various Ethereum client implementations.

mod http;
mod mock;

pub use self::{
    http::{PKSigningClient, QueryClient, SigningClient},
    mock::MockEthereum,
};
