//! Health checks over engine statistics

use crate::room::{RoomEngine, RoomEngineStats};

/// Overall health of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health status together with the statistics it was derived from
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub stats: RoomEngineStats,
}

/// Health check entry point
pub struct HealthCheck;

impl HealthCheck {
    /// Probe the engine; an unreadable store means the service cannot
    /// answer requests.
    pub fn check(engine: &RoomEngine) -> HealthReport {
        match engine.get_stats() {
            Ok(stats) => HealthReport {
                status: HealthStatus::Healthy,
                stats,
            },
            Err(_) => HealthReport {
                status: HealthStatus::Unhealthy,
                stats: RoomEngineStats::default(),
            },
        }
    }
}
