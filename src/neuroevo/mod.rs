pub mod error;
pub mod settings;
pub mod network;
pub mod snapshot;
pub mod population;
pub mod engine;
