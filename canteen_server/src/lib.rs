//! # Canteen order server
//! This crate hosts the HTTP surface of the canteen ordering service. It is responsible for:
//! * Authenticating callers with bearer JWTs.
//! * Opening payment intents with the gateway on the caller's behalf.
//! * Confirming payments and committing the resulting orders.
//! * Running the background workers that deliver the change streams to the notification dispatcher, and that retry
//!   failed account reaps.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/create_payment_intent`: Opens a payment intent with the gateway.
//! * `/api/confirm_payment`: Verifies a completed payment and commits the order.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;
pub mod workers;

#[cfg(test)]
mod endpoint_tests;
