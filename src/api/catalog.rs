// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! Public catalog reads and provider authoring.
//!
//! The locally-known role gates UI affordances only; every provider call is
//! dispatched regardless and the server's 403 is the authoritative
//! rejection.

use std::sync::Arc;

use tracing::debug;

use crate::auth::SessionManager;
use crate::dispatch::Dispatcher;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    Channel, CreateModuleRequest, CreateScenarioRequest, CreatedResponse, Module, ModuleId,
    ScenarioId,
};

/// Catalog browsing plus provider module/scenario authoring.
pub struct CatalogClient {
    dispatcher: Arc<Dispatcher>,
    session: Arc<SessionManager>,
}

impl CatalogClient {
    pub fn new(dispatcher: Arc<Dispatcher>, session: Arc<SessionManager>) -> Self {
        Self {
            dispatcher,
            session,
        }
    }

    /// Public catalog listing. Unauthenticated and always permitted.
    pub async fn list_catalog(&self) -> ClientResult<Vec<Module>> {
        self.dispatcher.get("/catalog/modules").await
    }

    /// The authenticated provider's own modules.
    pub async fn provider_modules(&self) -> ClientResult<Vec<Module>> {
        self.log_role_hint("list own modules");
        self.dispatcher.get("/provider/modules").await
    }

    /// Author a new module. A blank title is rejected locally.
    pub async fn create_module(
        &self,
        title: &str,
        description: &str,
        price: u64,
    ) -> ClientResult<ModuleId> {
        if title.trim().is_empty() {
            return Err(ClientError::validation("title must not be empty"));
        }

        self.log_role_hint("create module");
        let request = CreateModuleRequest {
            title: title.to_string(),
            description: description.to_string(),
            price,
        };
        let created: CreatedResponse = self.dispatcher.post("/provider/modules", &request).await?;
        Ok(ModuleId(created.id))
    }

    /// Author a scenario within a module.
    ///
    /// Rejected locally when no module is selected, the prompt is blank, or
    /// the correct choice is not 0/1.
    pub async fn create_scenario(
        &self,
        module_id: Option<ModuleId>,
        channel: Channel,
        prompt: &str,
        correct_choice: u8,
    ) -> ClientResult<ScenarioId> {
        let Some(module_id) = module_id else {
            return Err(ClientError::validation("no module selected"));
        };
        if prompt.trim().is_empty() {
            return Err(ClientError::validation("prompt must not be empty"));
        }
        if correct_choice > 1 {
            return Err(ClientError::validation("correct choice must be 0 or 1"));
        }

        self.log_role_hint("create scenario");
        let request = CreateScenarioRequest {
            channel,
            prompt: prompt.to_string(),
            correct_choice,
        };
        let created: CreatedResponse = self
            .dispatcher
            .post(&format!("/provider/modules/{module_id}/scenarios"), &request)
            .await?;
        Ok(ScenarioId(created.id))
    }

    fn log_role_hint(&self, operation: &str) {
        let authoring = self.session.role().is_some_and(|r| r.can_author());
        if !authoring {
            debug!(operation, "provider call without a provider role hint");
        }
    }
}
