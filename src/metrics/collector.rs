//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the green-room service using
//! Prometheus metrics.

use crate::room::RoomEngineStats;
use crate::types::JoinRoomResult;
use anyhow::Result;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;

/// Main metrics collector for the room service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Room lifecycle metrics
    room_metrics: RoomMetrics,

    /// User directory metrics
    user_metrics: UserMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Total HTTP requests by endpoint and status class
    pub http_requests_total: IntCounterVec,
}

/// Room lifecycle metrics
#[derive(Clone)]
pub struct RoomMetrics {
    /// Current number of rooms waiting for members
    pub waiting_rooms: IntGauge,

    /// Total rooms created
    pub rooms_created_total: IntCounter,

    /// Join attempts by outcome
    pub joins_total: IntCounterVec,

    /// Total games started
    pub games_started_total: IntCounter,

    /// Total rooms dissolved, by reason
    pub rooms_dissolved_total: IntCounterVec,

    /// Total member results recorded
    pub results_recorded_total: IntCounter,
}

/// User directory metrics
#[derive(Clone)]
pub struct UserMetrics {
    /// Total users created
    pub users_created_total: IntCounter,

    /// Token collisions hit during user creation
    pub token_conflicts_total: IntCounter,
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds = IntGauge::with_opts(Opts::new(
            "greenroom_uptime_seconds",
            "Service uptime in seconds",
        ))?;
        let health_status = IntGauge::with_opts(Opts::new(
            "greenroom_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        ))?;
        let http_requests_total = IntCounterVec::new(
            Opts::new("greenroom_http_requests_total", "HTTP requests processed"),
            &["endpoint", "status"],
        )?;

        registry.register(Box::new(uptime_seconds.clone()))?;
        registry.register(Box::new(health_status.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            http_requests_total,
        })
    }
}

impl RoomMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let waiting_rooms = IntGauge::with_opts(Opts::new(
            "greenroom_waiting_rooms",
            "Rooms currently waiting for members",
        ))?;
        let rooms_created_total = IntCounter::with_opts(Opts::new(
            "greenroom_rooms_created_total",
            "Rooms created",
        ))?;
        let joins_total = IntCounterVec::new(
            Opts::new("greenroom_joins_total", "Join attempts by outcome"),
            &["outcome"],
        )?;
        let games_started_total = IntCounter::with_opts(Opts::new(
            "greenroom_games_started_total",
            "Games started",
        ))?;
        let rooms_dissolved_total = IntCounterVec::new(
            Opts::new(
                "greenroom_rooms_dissolved_total",
                "Rooms dissolved, by reason",
            ),
            &["reason"],
        )?;
        let results_recorded_total = IntCounter::with_opts(Opts::new(
            "greenroom_results_recorded_total",
            "Member results recorded",
        ))?;

        registry.register(Box::new(waiting_rooms.clone()))?;
        registry.register(Box::new(rooms_created_total.clone()))?;
        registry.register(Box::new(joins_total.clone()))?;
        registry.register(Box::new(games_started_total.clone()))?;
        registry.register(Box::new(rooms_dissolved_total.clone()))?;
        registry.register(Box::new(results_recorded_total.clone()))?;

        Ok(Self {
            waiting_rooms,
            rooms_created_total,
            joins_total,
            games_started_total,
            rooms_dissolved_total,
            results_recorded_total,
        })
    }
}

impl UserMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let users_created_total = IntCounter::with_opts(Opts::new(
            "greenroom_users_created_total",
            "Users created",
        ))?;
        let token_conflicts_total = IntCounter::with_opts(Opts::new(
            "greenroom_token_conflicts_total",
            "Token collisions during user creation",
        ))?;

        registry.register(Box::new(users_created_total.clone()))?;
        registry.register(Box::new(token_conflicts_total.clone()))?;

        Ok(Self {
            users_created_total,
            token_conflicts_total,
        })
    }
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create a new metrics collector on an existing registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let room_metrics = RoomMetrics::new(&registry)?;
        let user_metrics = UserMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            room_metrics,
            user_metrics,
        })
    }

    /// Get the Prometheus registry for scraping
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Service-level metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Room lifecycle metrics
    pub fn room(&self) -> &RoomMetrics {
        &self.room_metrics
    }

    /// User directory metrics
    pub fn user(&self) -> &UserMetrics {
        &self.user_metrics
    }

    pub fn record_room_created(&self) {
        self.room_metrics.rooms_created_total.inc();
    }

    pub fn record_join_outcome(&self, outcome: JoinRoomResult) {
        self.room_metrics
            .joins_total
            .with_label_values(&[join_outcome_label(outcome)])
            .inc();
    }

    pub fn record_game_started(&self) {
        self.room_metrics.games_started_total.inc();
    }

    pub fn record_room_dissolved(&self, reason: &str) {
        self.room_metrics
            .rooms_dissolved_total
            .with_label_values(&[reason])
            .inc();
    }

    pub fn record_result_submitted(&self) {
        self.room_metrics.results_recorded_total.inc();
    }

    pub fn record_user_created(&self) {
        self.user_metrics.users_created_total.inc();
    }

    pub fn record_http_request(&self, endpoint: &str, status: u16) {
        self.service_metrics
            .http_requests_total
            .with_label_values(&[endpoint, status_class(status)])
            .inc();
    }

    /// Update the health status gauge (0=unhealthy, 1=degraded, 2=healthy)
    pub fn update_health_status(&self, status: i64) {
        self.service_metrics.health_status.set(status);
    }

    /// Refresh gauges from engine statistics
    pub fn update_from_engine_stats(&self, stats: &RoomEngineStats) {
        self.room_metrics.waiting_rooms.set(stats.waiting_rooms as i64);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        // registration on a fresh registry cannot collide
        Self::new().expect("Failed to create metrics collector")
    }
}

fn join_outcome_label(outcome: JoinRoomResult) -> &'static str {
    match outcome {
        JoinRoomResult::Ok => "ok",
        JoinRoomResult::RoomFull => "room_full",
        JoinRoomResult::Disbanded => "disbanded",
        JoinRoomResult::OtherError => "other_error",
    }
}

fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}
