pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod hero;
pub mod hero_service;
pub mod pet;
pub mod pet_state;
pub mod service;
pub mod storage;
pub mod telemetry;
pub mod types;
pub mod utils;
