pub mod client;
pub mod connector;
pub mod mock;
pub mod models;
pub mod registry;
pub mod repository;

pub use client::HttpProviderClient;
pub use connector::{HttpConnector, ProviderConnector};
pub use mock::{MockConnector, MockProviderClient};
pub use models::{Provider, ProviderService};
pub use registry::{NewProvider, ProviderRegistry, RegistryError, Selection, SyncPolicy, SyncReport};
pub use repository::ProviderRepository;
