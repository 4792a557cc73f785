//! Integration suite for the Northwind Products REST API, plus an in-process
//! stand-in of that API for running the suite without the real server.

pub mod client;
pub mod config;
pub mod domain;
pub mod dtos;
pub mod error;
pub mod fixtures;
pub mod repositories;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

pub use client::{ApiResponse, ProductsApi};
pub use config::SuiteConfig;
pub use domain::Product;
pub use dtos::ProductPatch;
pub use error::SuiteError;
