//! The tool registry: `providers: map<ToolType, Provider>` plus a
//! `tool_owner: map<tool_name, ToolType>` populated as tools register.

use std::collections::HashMap;
use std::sync::Arc;

use lacquer_context::ExecutionContext;
use lacquer_core::{ToolDefinition, ToolType};

use crate::error::ToolError;
use crate::provider::ToolProvider;
use crate::types::{ToolRegistration, ToolResult};

/// Owns one provider per [`ToolType`] and dispatches `execute_tool` calls
/// to whichever provider owns the named tool.
pub struct ToolRegistry {
    providers: HashMap<ToolType, Arc<dyn ToolProvider>>,
    tool_owner: HashMap<String, ToolType>,
    tool_definitions: HashMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { providers: HashMap::new(), tool_owner: HashMap::new(), tool_definitions: HashMap::new() }
    }

    /// Register a provider for its `ToolType`. Registering a second
    /// provider for an already-registered type is an error.
    pub fn register_provider(&mut self, provider: Arc<dyn ToolProvider>) -> Result<(), ToolError> {
        let kind = provider.tool_type();
        if self.providers.contains_key(&kind) {
            return Err(ToolError::DuplicateProvider(kind));
        }
        self.providers.insert(kind, provider);
        Ok(())
    }

    /// Register one tool with whichever provider serves its declared
    /// `ToolType`. Forwards to that provider's `add_tool`. Duplicate tool
    /// names, even across providers of different types, are an error.
    pub async fn register_tool(&mut self, registration: ToolRegistration) -> Result<(), ToolError> {
        let name = registration.definition.name.clone();
        if self.tool_owner.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }
        let kind = registration.definition.tool_type;
        let provider = self
            .providers
            .get(&kind)
            .cloned()
            .ok_or_else(|| ToolError::NotFound(format!("no provider registered for {kind:?}")))?;
        provider.add_tool(registration.clone()).await?;
        self.tool_owner.insert(name.clone(), kind);
        self.tool_definitions.insert(name, registration.definition);
        Ok(())
    }

    /// Dispatch a tool call to its owning provider.
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        raw_params_json: &str,
        exec_ctx: &ExecutionContext,
    ) -> Result<ToolResult, ToolError> {
        let kind = self
            .tool_owner
            .get(tool_name)
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;
        let provider = self.providers.get(kind).expect("tool_owner entries always have a live provider");
        provider.execute_tool(tool_name, raw_params_json, exec_ctx).await
    }

    /// Close every registered provider, collecting the first error (if
    /// any) but attempting to close all of them regardless.
    pub async fn close(&self) -> Result<(), ToolError> {
        let mut first_err = None;
        for provider in self.providers.values() {
            if let Err(err) = provider.close().await {
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Whether a tool by this name has been registered.
    pub fn has_tool(&self, tool_name: &str) -> bool {
        self.tool_owner.contains_key(tool_name)
    }

    /// The registered definition for one tool, if it exists — what an
    /// agent's `ModelRequest.tools` entry is built from.
    pub fn tool_definition(&self, tool_name: &str) -> Option<&ToolDefinition> {
        self.tool_definitions.get(tool_name)
    }

    /// Definitions for every name in `tool_names` that's actually
    /// registered; unknown names are silently skipped rather than erroring
    /// — an agent that lists a never-registered tool simply doesn't get it
    /// in its visible tool set.
    pub fn tool_definitions(&self, tool_names: &[String]) -> Vec<ToolDefinition> {
        tool_names.iter().filter_map(|name| self.tool_definitions.get(name).cloned()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lacquer_core::{Workflow, WorkflowBody, ToolDefinition};

    struct EchoProvider;

    #[async_trait]
    impl ToolProvider for EchoProvider {
        fn tool_type(&self) -> ToolType {
            ToolType::Native
        }

        async fn add_tool(&self, _registration: ToolRegistration) -> Result<(), ToolError> {
            Ok(())
        }

        async fn execute_tool(
            &self,
            tool_name: &str,
            raw_params_json: &str,
            _exec_ctx: &ExecutionContext,
        ) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::ok(format!("{tool_name}:{raw_params_json}")))
        }
    }

    fn minimal_workflow() -> Workflow {
        Workflow {
            version: "1".into(),
            name: None,
            metadata: Default::default(),
            agents: Default::default(),
            workflow: WorkflowBody {
                inputs: serde_json::json!({}),
                state: Default::default(),
                steps: vec![],
                outputs: Default::default(),
            },
        }
    }

    fn definition(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: "test tool".into(),
            tool_type: ToolType::Native,
            parameters: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn duplicate_provider_registration_for_same_type_is_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register_provider(Arc::new(EchoProvider)).unwrap();
        let err = registry.register_provider(Arc::new(EchoProvider)).unwrap_err();
        assert!(matches!(err, ToolError::DuplicateProvider(ToolType::Native)));
    }

    #[tokio::test]
    async fn duplicate_tool_names_across_registration_are_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register_provider(Arc::new(EchoProvider)).unwrap();
        registry
            .register_tool(ToolRegistration { definition: definition("search"), provider_config: serde_json::json!({}) })
            .await
            .unwrap();
        let err = registry
            .register_tool(ToolRegistration { definition: definition("search"), provider_config: serde_json::json!({}) })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::DuplicateTool(name) if name == "search"));
    }

    #[tokio::test]
    async fn execute_tool_dispatches_to_the_owning_provider() {
        let mut registry = ToolRegistry::new();
        registry.register_provider(Arc::new(EchoProvider)).unwrap();
        registry
            .register_tool(ToolRegistration { definition: definition("search"), provider_config: serde_json::json!({}) })
            .await
            .unwrap();

        let ctx = ExecutionContext::new(&minimal_workflow(), serde_json::json!({}));
        let result = registry.execute_tool("search", "{}", &ctx).await.unwrap();
        assert_eq!(result.content, "search:{}");
    }

    #[tokio::test]
    async fn execute_tool_on_an_unregistered_name_is_not_found() {
        let registry = ToolRegistry::new();
        let ctx = ExecutionContext::new(&minimal_workflow(), serde_json::json!({}));
        let err = registry.execute_tool("ghost", "{}", &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(name) if name == "ghost"));
    }
}
