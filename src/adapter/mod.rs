//! Framework adapters binding the context abstraction to a web framework

pub mod axum;

pub use self::axum::{route_service, GatewayService};
