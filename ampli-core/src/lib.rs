pub mod error;
pub mod provider;

pub use error::StorageError;
pub use provider::{
    ProviderClient, ProviderError, ProviderOrderState, ProviderOrderStatus, RemoteService,
};
