#![deny(unsafe_code)]

/// Desktop client for a REST chat backend, built with GPUI and gpui-component.
pub mod app;
/// Chat pane, sidebar, composer and the surface the controller draws through.
pub mod chat;
/// Settings persistence and UI.
pub mod settings;
