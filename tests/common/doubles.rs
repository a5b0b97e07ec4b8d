//! Recording doubles for the refresh processor's collaborators and the
//! message delivery transport.

use async_trait::async_trait;
use instance_agent::association::{
    AssociationDetail, AssociationDirectory, AssociationStatus, AssociationSummary,
    ExecutionSignal, InstanceAssociation, InstanceIdentity, OutputUploader, ScheduleManager,
    StatusUpdate, UploadRequest,
};
use instance_agent::error::{AgentError, AgentResult};
use instance_agent::messaging::{MessageTransport, TransportError};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const INSTANCE_ID: &str = "i-0123456789abcdef0";

pub fn association(id: &str, status: Option<AssociationStatus>) -> InstanceAssociation {
    InstanceAssociation::new(AssociationSummary {
        association_id: Some(id.to_string()),
        name: Some(format!("{id}-document")),
        instance_id: Some(INSTANCE_ID.to_string()),
        checksum: Some(format!("{id}-checksum")),
        schedule_expression: Some("rate(30 minutes)".to_string()),
        detailed_status: status,
        ..Default::default()
    })
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Instance identity returning a fixed id or a fixed failure
pub struct StaticIdentity(pub AgentResult<String>);

impl StaticIdentity {
    pub fn ok() -> Self {
        Self(Ok(INSTANCE_ID.to_string()))
    }

    pub fn failing(message: &str) -> Self {
        Self(Err(AgentError::other(message)))
    }
}

#[async_trait]
impl InstanceIdentity for StaticIdentity {
    async fn instance_id(&self) -> AgentResult<String> {
        self.0.clone()
    }
}

#[derive(Debug, Default)]
pub struct DirectoryState {
    pub listings: Vec<String>,
    pub loaded: Vec<String>,
    pub updates: Vec<StatusUpdate>,
}

/// Association directory serving a fixed listing and recording every call
pub struct RecordingDirectory {
    associations: Vec<InstanceAssociation>,
    list_error: Option<String>,
    failing_loads: HashSet<String>,
    detail_expressions: Vec<(String, String)>,
    state: Arc<Mutex<DirectoryState>>,
}

impl RecordingDirectory {
    pub fn new(associations: Vec<InstanceAssociation>) -> Self {
        Self {
            associations,
            list_error: None,
            failing_loads: HashSet::new(),
            detail_expressions: Vec::new(),
            state: Arc::new(Mutex::new(DirectoryState::default())),
        }
    }

    pub fn with_list_error(mut self, message: &str) -> Self {
        self.list_error = Some(message.to_string());
        self
    }

    pub fn with_failing_load(mut self, association_id: &str) -> Self {
        self.failing_loads.insert(association_id.to_string());
        self
    }

    /// Serve `expression` from the loaded detail of `association_id`
    pub fn with_detail_expression(mut self, association_id: &str, expression: &str) -> Self {
        self.detail_expressions
            .push((association_id.to_string(), expression.to_string()));
        self
    }

    pub fn state(&self) -> Arc<Mutex<DirectoryState>> {
        Arc::clone(&self.state)
    }
}

#[async_trait]
impl AssociationDirectory for RecordingDirectory {
    async fn list(&self, instance_id: &str) -> AgentResult<Vec<InstanceAssociation>> {
        self.state
            .lock()
            .unwrap()
            .listings
            .push(instance_id.to_string());
        match &self.list_error {
            Some(message) => Err(AgentError::directory("ListInstanceAssociations", message)),
            None => Ok(self.associations.clone()),
        }
    }

    async fn load_detail(&self, association: &mut InstanceAssociation) -> AgentResult<()> {
        let id = association.association_id()?.to_string();
        self.state.lock().unwrap().loaded.push(id.clone());

        if self.failing_loads.contains(&id) {
            return Err(AgentError::directory("DescribeAssociation", "throttled"));
        }

        let schedule_expression = self
            .detail_expressions
            .iter()
            .find(|(assoc_id, _)| *assoc_id == id)
            .map(|(_, expression)| expression.clone());
        association.detail = Some(AssociationDetail {
            document: Some("{}".to_string()),
            schedule_expression,
        });
        Ok(())
    }

    async fn update_status(&self, update: StatusUpdate) -> AgentResult<()> {
        self.state.lock().unwrap().updates.push(update);
        Ok(())
    }
}

/// Schedule manager recording the ids of every refreshed list
#[derive(Default)]
pub struct RecordingScheduleManager {
    pub refreshed: Mutex<Vec<Vec<String>>>,
}

impl ScheduleManager for RecordingScheduleManager {
    fn refresh(&self, associations: &[InstanceAssociation]) {
        let ids = associations
            .iter()
            .map(|a| a.display_id().to_string())
            .collect();
        self.refreshed.lock().unwrap().push(ids);
    }
}

#[derive(Default)]
pub struct CountingSignal {
    pub count: AtomicUsize,
}

impl CountingSignal {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ExecutionSignal for CountingSignal {
    fn execute(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub plugin_id: String,
    pub bucket_name: Option<String>,
    pub stdout: String,
    pub stderr: String,
}

/// Uploader recording each request and returning a configured error list
#[derive(Default)]
pub struct RecordingUploader {
    pub uploads: Mutex<Vec<RecordedUpload>>,
    pub errors: Vec<AgentError>,
}

#[async_trait]
impl OutputUploader for RecordingUploader {
    async fn upload(&self, request: UploadRequest<'_>) -> Vec<AgentError> {
        self.uploads.lock().unwrap().push(RecordedUpload {
            plugin_id: request.plugin_id.to_string(),
            bucket_name: request.bucket_name.map(str::to_string),
            stdout: request.stdout.to_string(),
            stderr: request.stderr.to_string(),
        });
        self.errors.clone()
    }
}

/// One scripted transport response, optionally after a delay
pub struct ScriptedResponse {
    pub delay: Duration,
    pub result: Result<Value, TransportError>,
}

impl ScriptedResponse {
    pub fn ok(value: Value) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(value),
        }
    }

    pub fn fail_after(delay: Duration, message: &str) -> Self {
        Self {
            delay,
            result: Err(TransportError::request(message)),
        }
    }
}

/// Transport replaying scripted responses and recording every call.
///
/// With an empty script the call blocks forever, which models a long poll
/// the remote side never answers.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ScriptedResponse>>,
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<ScriptedResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageTransport for ScriptedTransport {
    async fn call(
        &self,
        operation: &'static str,
        body: Value,
    ) -> Result<Value, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((operation.to_string(), body));

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(response) => {
                if !response.delay.is_zero() {
                    tokio::time::sleep(response.delay).await;
                }
                response.result
            }
            None => std::future::pending().await,
        }
    }
}
