//! API Module
//!
//! HTTP handlers and routing exposing the cache contract and session storage.
//!
//! # Endpoints
//! - `PUT /set`, `GET /get/:key`, `DELETE /del/:key` - Scalar values
//! - `PUT /hset`, `GET /hget/:key/:field`, `GET /hgetall/:key` - Hash fields
//! - `POST /sessions`, `GET|PUT|DELETE /sessions/:id` - Sessions
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
