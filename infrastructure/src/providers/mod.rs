//! Provider adapters and the client registry builder.

pub mod command;
pub mod registry;

pub use command::CommandModelClient;
pub use registry::{ProviderSetup, build_clients, build_clients_with};
