pub mod catalog_store;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod features;
pub mod fpl_fetch;
pub mod http_cache;
pub mod http_client;
pub mod model;
pub mod player;
pub mod predictor;
pub mod request;
pub mod squad;
pub mod synthetic;
pub mod teams;
pub mod transfers;

pub use engine::Engine;
