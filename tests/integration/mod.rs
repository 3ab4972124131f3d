//! Scenario-level integration tests

mod api_surface;
mod room_lifecycle;
