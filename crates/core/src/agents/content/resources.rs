use async_trait::async_trait;
use schemars::JsonSchema;
use serde_json::{json, Value};

use super::topic_line;
use crate::agents::{coerce, prompts, Agent, AgentOutput};
use crate::gateway::{ModelCallSpec, ModelGateway};
use crate::state::{AgentId, ExternalResource, LearningState, ResourceKind, StateField, StateUpdate};

#[derive(JsonSchema)]
#[allow(dead_code)]
struct ResourcesOutput {
    external_resources: Vec<ExternalResource>,
}

/// Suggests a few external resources (h4). Entries without a URL are dropped.
pub struct ResourceCurator;

impl ResourceCurator {
    fn default_resources(topic: &str) -> Vec<ExternalResource> {
        vec![ExternalResource {
            kind: ResourceKind::Link,
            title: format!("{topic} documentation"),
            url: "https://example.com".to_string(),
            description: "Reference".to_string(),
            provider: None,
        }]
    }

    fn resource(value: &Value) -> Option<ExternalResource> {
        let url = coerce::optional_string(value, "url")?;
        Some(ExternalResource {
            kind: coerce::variant(value, "type", ResourceKind::Link),
            title: coerce::string(value, "title", &url),
            description: coerce::string(value, "description", ""),
            provider: coerce::optional_string(value, "provider"),
            url,
        })
    }

    fn update(resources: Vec<ExternalResource>) -> StateUpdate {
        StateUpdate {
            external_resources: Some(resources),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Agent for ResourceCurator {
    fn id(&self) -> AgentId {
        AgentId::RESOURCES
    }

    fn label(&self) -> &'static str {
        "H4 (Resources)"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::ExternalResources]
    }

    async fn execute(
        &self,
        state: &LearningState,
        gateway: &ModelGateway,
    ) -> anyhow::Result<AgentOutput> {
        let topic = state.topic();
        let spec = ModelCallSpec::new(
            self.label(),
            prompts::with_schema::<ResourcesOutput>(prompts::RESOURCES),
            topic_line(state),
            json!({ "external_resources": Self::default_resources(topic) }),
        );
        let value = gateway.call(&spec).await.value;

        let mut resources: Vec<ExternalResource> = coerce::objects(&value, "external_resources")
            .filter_map(Self::resource)
            .collect();
        if resources.is_empty() {
            resources = Self::default_resources(topic);
        }

        let details = format!("{} resources", resources.len());
        Ok(AgentOutput::new(Self::update(resources), "Resources Curated").with_details(details))
    }

    fn fallback(&self, state: &LearningState) -> StateUpdate {
        Self::update(Self::default_resources(state.topic()))
    }
}
