/// Router Module Index
///
/// Routes are split by who may call them. Access control is applied per module
/// with Axum layers, and again by the extractors each handler takes.

/// API routes open to anonymous callers (health, registration, login, logout).
pub mod public;

/// API routes behind the `AuthUser` extractor.
pub mod authenticated;

/// API routes restricted to the 'admin' role.
pub mod admin;

/// The front-end pages, served from the static site directory behind the gate.
pub mod pages;
