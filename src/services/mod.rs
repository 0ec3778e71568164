// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - trip engine and business logic layer.

pub mod aggregator;
pub mod location;
pub mod motion;
pub mod recorder;
pub mod scoring;
pub mod session;
pub mod stats;

pub use aggregator::{DriveSegment, TripAggregator};
pub use location::{
    run_location_feed, Accuracy, FeedSummary, LocationSource, ReplaySource, SubscriptionConfig,
};
pub use motion::{classify, ClassifierState, MotionState};
pub use recorder::{PendingWrite, TripRecorder};
pub use session::{spawn_idle_sweeper, DriveSession, SampleOutcome, SessionRegistry, SessionSlot};
pub use stats::StatsService;
