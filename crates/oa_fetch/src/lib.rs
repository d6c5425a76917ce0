pub mod cli;
pub mod client;
pub mod config;
pub mod doi;
pub mod logging;
pub mod manager;
pub mod pipeline;
pub mod resolver;

pub use cli::{handle_command, FetchCommands, InputArgs};
pub use client::{HttpPageFetcher, OpenAlexClient};
pub use config::OpenAlexConfig;
pub use manager::{FetchManager, FetchOptions};
pub use resolver::{Resolution, Resolver};
