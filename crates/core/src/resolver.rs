//! Capability Resolver: model id → model record → descriptor → factory.
//!
//! Resolution reads the model table through the caller's scope and the
//! in-memory registry; it never creates anything. Binding filters the
//! caller's parameters to the descriptor's allow-list and runs the factory.

use std::sync::Arc;

use crate::capability::{
    CapabilityContext, CapabilityHandler, CapabilityParams, ConstructionError, HandlerFactory,
};
use crate::error::CoreError;
use crate::models::Model;
use crate::registry::{CapabilityDescriptor, CapabilityRegistry};
use crate::store::StoreScope;
use crate::types::DbId;

/// A model id resolved to everything needed to run it.
#[derive(Clone)]
pub struct ResolvedCapability<'r> {
    pub model: Model,
    pub descriptor: &'r CapabilityDescriptor,
    pub factory: HandlerFactory,
}

impl std::fmt::Debug for ResolvedCapability<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCapability")
            .field("model", &self.model)
            .field("descriptor", &self.descriptor.name)
            .field("capability", &self.descriptor.capability)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CapabilityResolver {
    registry: Arc<CapabilityRegistry>,
}

impl CapabilityResolver {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Resolve `model_id` to its descriptor and factory.
    ///
    /// Both an unknown id and a registered name with no descriptor are
    /// [`CoreError::NotRegistered`].
    pub async fn resolve(
        &self,
        scope: &mut dyn StoreScope,
        model_id: DbId,
    ) -> Result<ResolvedCapability<'_>, CoreError> {
        let model = scope
            .find_model(model_id)
            .await?
            .ok_or(CoreError::NotRegistered { model_id })?;

        let Some(descriptor) = self.registry.get(&model.ml_model_name) else {
            tracing::warn!(
                model_id,
                model_name = %model.ml_model_name,
                "Model has no capability descriptor",
            );
            return Err(CoreError::NotRegistered { model_id });
        };

        Ok(ResolvedCapability {
            model,
            descriptor,
            factory: descriptor.capability.factory(),
        })
    }

    /// Build a handler for one job.
    ///
    /// Parameters outside the descriptor's allow-list are dropped silently
    /// before the factory sees them.
    pub fn bind(
        &self,
        resolved: &ResolvedCapability<'_>,
        params: CapabilityParams,
        ctx: &CapabilityContext,
    ) -> Result<Box<dyn CapabilityHandler>, ConstructionError> {
        let (params, dropped) = params.retain_allowed(&resolved.descriptor.params);
        if !dropped.is_empty() {
            tracing::debug!(
                model_id = resolved.model.id,
                model_name = %resolved.descriptor.name,
                dropped = ?dropped,
                "Ignoring parameters not accepted by the capability",
            );
        }
        (resolved.factory)(params, ctx)
    }
}
