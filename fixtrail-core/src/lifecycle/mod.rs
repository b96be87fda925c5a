//! Lifecycle Control
//!
//! This module reacts to the host application's foreground/background
//! transitions, selecting the sampling strategy and triggering persistence.
//! The host owns the real lifecycle signal and calls
//! [`LifecycleController::on_enter_foreground`] /
//! [`LifecycleController::on_enter_background`] explicitly; no process-wide
//! observer registration is involved.
//!
//! The controller talks to two collaborators, passed by reference at each
//! call:
//!
//! - [`SamplingDriver`] - the location sensor that actually starts and
//!   stops sampling
//! - [`AuthorizationSource`] - the platform's authorization state, read as
//!   a synchronous snapshot at the moment of a transition and never cached
//!
//! # Strategy selection
//!
//! Entering the background flushes the engine and switches to coarse
//! significant-change sampling, but only when authorization allows
//! background monitoring and the platform reports it available; otherwise
//! the controller stays on continuous sampling, still flagged background.
//! Entering the foreground resumes continuous sampling unconditionally.
//! Both transitions are idempotent.

mod permission;

pub use permission::{AuthorizationRequest, PermissionError};

use serde::{Deserialize, Serialize};

use crate::engine::HistoryEngine;
use crate::error::HistoryError;

/// Default minimum movement before the sensor reports a new fix, in meters.
pub const DEFAULT_DISTANCE_FILTER_METERS: f64 = 25.0;

/// Application run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Foreground,
    Background,
}

impl Default for RunState {
    fn default() -> Self {
        RunState::Foreground
    }
}

/// Sampling strategy requested from the sensor collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// Dense polling; the foreground strategy.
    Continuous,
    /// Coarse monitoring that only reports large movements; the
    /// battery-saving background strategy.
    SignificantChange,
}

impl Default for SamplingMode {
    fn default() -> Self {
        SamplingMode::Continuous
    }
}

/// Platform location authorization level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    /// Location access denied or restricted.
    Denied,
    /// Access only while the app is in the foreground.
    ForegroundOnly,
    /// Access at any time, including background monitoring.
    Always,
}

impl AuthorizationStatus {
    /// Whether this level permits coarse monitoring while backgrounded.
    pub fn allows_background_monitoring(&self) -> bool {
        matches!(self, AuthorizationStatus::Always)
    }
}

/// The platform's authorization state, queried at transition time.
pub trait AuthorizationSource {
    /// Current authorization level.
    fn status(&self) -> AuthorizationStatus;

    /// Whether the platform supports coarse significant-change monitoring.
    fn coarse_monitoring_available(&self) -> bool;
}

/// The sensor collaborator that performs the actual sampling.
pub trait SamplingDriver {
    /// Request a sampling strategy. Requests are idempotent; drivers may
    /// ignore a mode they are already in.
    fn set_mode(&mut self, mode: SamplingMode);

    /// Set the minimum movement before a new fix is reported, in meters.
    fn set_distance_filter(&mut self, meters: f64);
}

/// Controller configuration.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleConfig {
    /// Distance filter restored when a best-accuracy request is released.
    pub distance_filter_meters: f64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        LifecycleConfig {
            distance_filter_meters: DEFAULT_DISTANCE_FILTER_METERS,
        }
    }
}

/// Foreground/background lifecycle controller.
///
/// Starts in [`RunState::Foreground`] with continuous sampling.
#[derive(Debug)]
pub struct LifecycleController {
    run_state: RunState,
    mode: SamplingMode,
    distance_filter_meters: f64,
    best_accuracy: bool,
}

impl Default for LifecycleController {
    fn default() -> Self {
        LifecycleController::new(LifecycleConfig::default())
    }
}

impl LifecycleController {
    /// Create a controller in the foreground state.
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            run_state: RunState::Foreground,
            mode: SamplingMode::Continuous,
            distance_filter_meters: config.distance_filter_meters,
            best_accuracy: false,
        }
    }

    /// Current run state.
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Currently requested sampling mode.
    pub fn sampling_mode(&self) -> SamplingMode {
        self.mode
    }

    /// Whether the controller is in the background state.
    pub fn is_background(&self) -> bool {
        self.run_state == RunState::Background
    }

    /// Handle the app entering the background.
    ///
    /// Flushes the engine, then requests coarse significant-change
    /// sampling when the authorization snapshot permits it and the
    /// platform reports it available; otherwise keeps continuous sampling
    /// (degraded, still flagged background). The transition itself never
    /// fails; a flush failure is returned for the host to report. Firing
    /// while already backgrounded is a no-op.
    pub fn on_enter_background<A, D>(
        &mut self,
        auth: &A,
        driver: &mut D,
        engine: &mut HistoryEngine,
    ) -> Option<HistoryError>
    where
        A: AuthorizationSource,
        D: SamplingDriver,
    {
        if self.run_state == RunState::Background {
            return None;
        }
        self.run_state = RunState::Background;
        engine.set_background(true);

        let flush_error = engine.flush_to_store().err();

        self.mode = if auth.status().allows_background_monitoring()
            && auth.coarse_monitoring_available()
        {
            SamplingMode::SignificantChange
        } else {
            SamplingMode::Continuous
        };
        driver.set_mode(self.mode);

        flush_error
    }

    /// Handle the app entering the foreground.
    ///
    /// Resumes continuous sampling unconditionally. Firing while already
    /// foregrounded is a no-op.
    pub fn on_enter_foreground<D>(&mut self, driver: &mut D, engine: &mut HistoryEngine)
    where
        D: SamplingDriver,
    {
        if self.run_state == RunState::Foreground {
            return;
        }
        self.run_state = RunState::Foreground;
        engine.set_background(false);

        self.mode = SamplingMode::Continuous;
        driver.set_mode(self.mode);
    }

    /// Temporarily tighten the distance filter for best-accuracy sampling.
    ///
    /// The battery cost is on the caller; release with
    /// [`release_best_accuracy`](LifecycleController::release_best_accuracy).
    pub fn request_best_accuracy<D>(&mut self, driver: &mut D, distance_filter_meters: f64)
    where
        D: SamplingDriver,
    {
        self.best_accuracy = true;
        driver.set_distance_filter(distance_filter_meters);
    }

    /// Restore the configured distance filter after a best-accuracy
    /// request. A no-op when no request is active.
    pub fn release_best_accuracy<D>(&mut self, driver: &mut D)
    where
        D: SamplingDriver,
    {
        if !self.best_accuracy {
            return;
        }
        self.best_accuracy = false;
        driver.set_distance_filter(self.distance_filter_meters);
    }
}
