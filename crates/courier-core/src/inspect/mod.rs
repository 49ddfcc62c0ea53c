//! Inspection layer - Statistics and pipeline analysis.
//!
//! This module contains the read-only side channel:
//! - Analysis records for registered contracts
//! - Middleware reports in dispatch order
//! - Aggregate mediator statistics

pub mod analysis;
pub mod inspector;

pub use analysis::{
    AnalysisDetail, Cardinality, DeliveryPattern, MediatorStats, MiddlewareConfig,
    MiddlewareReport, NotificationAnalysis, RequestAnalysis,
};
pub use inspector::Inspector;
