//! Read-only inspection over the mediator surface.
//!
//! [`Inspector`] classifies registered contracts, reports handler and
//! subscriber cardinality, and renders middleware in the order dispatch
//! would run it. It never invokes handlers; counting is done purely through
//! [`ServiceProvider::resolve_many`].
//!
//! Middleware ordering goes through the same planner dispatch uses, so the
//! report cannot drift from execution.

use std::any::TypeId;

use crate::contract::descriptor::Role;
use crate::contract::order::Order;
use crate::dispatch::pipeline::{self, PipelineSet, Registered};
use crate::dispatch::subscribers::SubscriberCensus;
use crate::provider::ServiceProvider;
use crate::provider::registry::{ServiceRegistry, TypeRecord};

use super::analysis::{
    AnalysisDetail, Cardinality, DeliveryPattern, MediatorStats, MiddlewareConfig,
    MiddlewareReport, NotificationAnalysis, RequestAnalysis, grouped_role, module_path_of,
    type_params_of,
};

/// Snapshot view over a mediator's registrations.
///
/// Obtained from `Mediator::inspector()`; the subscriber census is frozen at
/// that moment, everything else is immutable anyway.
pub struct Inspector<'a> {
    registry: &'a ServiceRegistry,
    pipelines: &'a PipelineSet,
    census: SubscriberCensus,
    provider: Option<&'a dyn ServiceProvider>,
}

impl<'a> Inspector<'a> {
    pub(crate) fn new(
        registry: &'a ServiceRegistry,
        pipelines: &'a PipelineSet,
        census: SubscriberCensus,
    ) -> Self {
        Self {
            registry,
            pipelines,
            census,
            provider: None,
        }
    }

    /// Counts handlers against a host-supplied provider instead of the
    /// builder-frozen registry. The catalog of analyzed contracts stays the
    /// registry's.
    pub fn with_provider(mut self, provider: &'a dyn ServiceProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    fn handler_count(&self, contract: TypeId) -> usize {
        match self.provider {
            Some(provider) => provider.resolve_many(contract).len(),
            None => self.registry.resolve_many(contract).len(),
        }
    }

    /// Analysis records for query contracts.
    pub fn analyze_queries(&self, detailed: bool) -> Vec<RequestAnalysis> {
        self.analyze_requests(Role::Query, detailed)
    }

    /// Analysis records for command contracts.
    pub fn analyze_commands(&self, detailed: bool) -> Vec<RequestAnalysis> {
        self.analyze_requests(Role::Command, detailed)
    }

    fn analyze_requests(&self, want: Role, detailed: bool) -> Vec<RequestAnalysis> {
        self.registry
            .records()
            .iter()
            .filter(|record| {
                let descriptor = record.descriptor();
                grouped_role(descriptor.role(), &descriptor.short_name()) == want
            })
            .map(|record| {
                let handler_count = self.handler_count(record.contract());
                RequestAnalysis {
                    name: record.descriptor().short_name(),
                    role: record.descriptor().role(),
                    handler_count,
                    cardinality: Cardinality::of(handler_count),
                    detail: detailed.then(|| self.detail(record)),
                }
            })
            .collect()
    }

    /// Analysis records for notification contracts, subscriber reach
    /// included.
    pub fn analyze_notifications(&self, detailed: bool) -> Vec<NotificationAnalysis> {
        self.registry
            .records()
            .iter()
            .filter(|record| record.descriptor().role() == Role::Notification)
            .map(|record| {
                let handler_count = self.handler_count(record.contract());
                let subscriber_count = self.census.reach(record.descriptor().type_id());
                NotificationAnalysis {
                    name: record.descriptor().short_name(),
                    handler_count,
                    handler_cardinality: Cardinality::of(handler_count),
                    subscriber_count,
                    subscriber_cardinality: Cardinality::of(subscriber_count),
                    pattern: DeliveryPattern::derive(handler_count, subscriber_count),
                    detail: detailed.then(|| self.detail(record)),
                }
            })
            .collect()
    }

    fn detail(&self, record: &TypeRecord) -> AnalysisDetail {
        let descriptor = record.descriptor();
        let full = descriptor.type_name();
        AnalysisDetail {
            full_path: full.to_string(),
            module_path: module_path_of(full),
            type_params: type_params_of(full),
            response: descriptor.response().map(|key| key.short_name()),
            handlers: record.handler_names().to_vec(),
        }
    }

    /// Request middleware in the exact order dispatch would run it.
    pub fn analyze_middleware(&self) -> Vec<MiddlewareReport> {
        reports(&self.pipelines.request, self.pipelines.fallback)
    }

    /// Notification middleware in fan-out order.
    pub fn analyze_notification_middleware(&self) -> Vec<MiddlewareReport> {
        reports(&self.pipelines.notification, self.pipelines.fallback)
    }

    /// Request middleware names in registration order.
    pub fn registered_middleware(&self) -> Vec<String> {
        self.pipelines
            .request
            .iter()
            .map(|registered| registered.name.clone())
            .collect()
    }

    /// Declared-versus-effective configuration of the request pipeline, in
    /// registration order.
    pub fn middleware_configuration(&self) -> Vec<MiddlewareConfig> {
        self.pipelines
            .request
            .iter()
            .map(|registered| MiddlewareConfig {
                name: registered.name.clone(),
                declared: registered.declared,
                effective: registered.effective(self.pipelines.fallback),
                scope: registered.scope.label(),
                sequence: registered.sequence,
            })
            .collect()
    }

    /// Aggregate counts over the surface.
    pub fn stats(&self) -> MediatorStats {
        MediatorStats {
            queries: self.registry.count_role(Role::Query),
            commands: self.registry.count_role(Role::Command),
            streams: self.registry.count_role(Role::Stream),
            notifications: self.registry.count_role(Role::Notification),
            handlers: self
                .registry
                .records()
                .iter()
                .map(|record| record.handler_names().len())
                .sum(),
            subscribers: self.census.total(),
            request_middleware: self.pipelines.request.len(),
            notification_middleware: self.pipelines.notification.len(),
        }
    }
}

impl std::fmt::Debug for Inspector<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inspector")
            .field("contracts", &self.registry.records().len())
            .field("subscribers", &self.census.total())
            .finish()
    }
}

fn reports<C: ?Sized>(registrations: &[Registered<C>], fallback: Order) -> Vec<MiddlewareReport> {
    pipeline::ordered(registrations, fallback)
        .into_iter()
        .map(|registered| {
            let order = registered.effective(fallback);
            MiddlewareReport {
                name: registered.name.clone(),
                type_params: type_params_of(&registered.name),
                order,
                order_label: order.to_string(),
                scope: registered.scope.label(),
            }
        })
        .collect()
}
