use serde::Serialize;

/// Structured trace events emitted by the page agent and its hosts.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    AgentInjected {
        url: String,
    },
    AgentSkippedDuplicate,
    DocumentIdentified {
        document_id: String,
        url: String,
    },
    IdentificationSkipped {
        url: String,
    },
    ExtractionFailed {
        url: String,
    },
    DocumentStored {
        key: String,
        document_id: String,
    },
    StorageWriteFailed {
        key: String,
        error: String,
    },
    NavigationDetected {
        from: String,
        to: String,
    },
    MessageHandled {
        action: String,
        responded: bool,
    },
    AgentTerminated,
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "ap_event");
    }
}
