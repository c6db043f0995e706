#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use dreamforge_capability::{
    CapabilityError, CapabilityInvoker, CapabilityPayload, CapabilityResponse, GenerationError,
    TextGenerator,
};
use dreamforge_core::artifact::ArtifactSlot;
use dreamforge_pipeline::{
    ArtifactStore, LocalArtifactStore, PersistenceError, Pipeline, PromptEnhancer,
};

pub const IMAGE_ID: &str = "img.test.node";
pub const MODEL_ID: &str = "model.test.node";
pub const CALLER: &str = "super-user";

// ---------------------------------------------------------------------------
// Text generator
// ---------------------------------------------------------------------------

/// Answers every instruction with a fixed reply, or fails.
pub struct FakeGenerator {
    reply: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl TextGenerator for FakeGenerator {
    async fn generate(&self, instruction: &str) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(instruction.to_string());
        self.reply
            .clone()
            .ok_or_else(|| GenerationError::MalformedResponse("connection refused".into()))
    }
}

// ---------------------------------------------------------------------------
// Capability invoker
// ---------------------------------------------------------------------------

/// Scripted reply for one capability.
#[derive(Clone)]
pub enum Reply {
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Status(u16),
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub capability_id: String,
    pub payload: CapabilityPayload,
    pub caller_id: String,
}

/// Replays scripted replies per capability id and records every call.
#[derive(Default)]
pub struct FakeInvoker {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, capability_id: &str, reply: Reply) -> Self {
        self.replies.insert(capability_id.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, capability_id: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.capability_id == capability_id)
            .collect()
    }
}

impl CapabilityInvoker for FakeInvoker {
    async fn invoke(
        &self,
        capability_id: &str,
        payload: CapabilityPayload,
        caller_id: &str,
    ) -> Result<CapabilityResponse, CapabilityError> {
        self.calls.lock().unwrap().push(RecordedCall {
            capability_id: capability_id.to_string(),
            payload,
            caller_id: caller_id.to_string(),
        });
        match self.replies.get(capability_id) {
            Some(Reply::Bytes(bytes)) => Ok(CapabilityResponse::from_bytes(bytes.clone())),
            Some(Reply::Json(body)) => CapabilityResponse::from_json(body.clone()),
            Some(Reply::Status(status)) => Err(CapabilityError::Api {
                status: *status,
                body: "capability unavailable".into(),
            }),
            None => Err(CapabilityError::NotPermitted {
                capability_id: capability_id.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Artifact store
// ---------------------------------------------------------------------------

/// Local store that refuses writes to one slot.
pub struct FailingStore {
    inner: LocalArtifactStore,
    broken: ArtifactSlot,
}

impl FailingStore {
    pub fn new(inner: LocalArtifactStore, broken: ArtifactSlot) -> Self {
        Self { inner, broken }
    }
}

impl ArtifactStore for FailingStore {
    async fn persist(&self, slot: ArtifactSlot, bytes: &[u8]) -> Result<PathBuf, PersistenceError> {
        if slot == self.broken {
            return Err(PersistenceError {
                slot,
                action: "write",
                path: self.inner.slot_path(slot),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.inner.persist(slot, bytes).await
    }

    async fn read(&self, slot: ArtifactSlot) -> Result<Option<Vec<u8>>, PersistenceError> {
        self.inner.read(slot).await
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn pipeline<S: ArtifactStore>(
    generator: FakeGenerator,
    invoker: FakeInvoker,
    store: S,
) -> Pipeline<FakeGenerator, FakeInvoker, S> {
    Pipeline::new(PromptEnhancer::new(generator), invoker, store, IMAGE_ID, MODEL_ID)
}
