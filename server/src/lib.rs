//! UniNear Server - Campus events API.
//!
//! This crate provides the HTTP backend for UniNear, responsible for:
//! - Listing, creating, updating and deleting campus events
//! - Validating event payloads before they reach the database
//! - Forwarding sign-up and sign-in requests to the identity provider
//!
//! # Architecture
//!
//! The server is a thin, stateless layer in front of a hosted Supabase
//! project. Every request makes at most one call through the
//! [`gateway::DataGateway`] trait; [`supabase::SupabaseClient`] is the
//! production implementation. Nothing is cached or stored locally.

pub mod config;
pub mod cors;
pub mod error;
pub mod gateway;
pub mod routes;
pub mod schema;
pub mod supabase;
pub mod types;
