//! `ap-page-agent`: the page sync agent of the Account Planner extension.
//!
//! The agent runs once per spreadsheet page.  It extracts the document id
//! from the page URL, stores it in extension-local storage, answers
//! request/response queries from the popup and background process, and
//! re-identifies the document after client-side navigation.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──inject──▶ Initializing ──▶ Active ──unload──▶ Terminated
//!                 (claims the Lifecycle;      │
//!                  second inject = no-op)     └─ mutation with new URL:
//!                                                re-arm settle timer,
//!                                                identify when it fires
//! ```
//!
//! The host supplies the environment as capabilities: [`PageHost`],
//! [`NavigationSource`], [`ExtensionStorage`] and [`MessageBus`].  Nothing
//! the agent does at runtime returns an error to the host; failures are
//! logged and degrade to a missing id, a skipped write or an `{error}`
//! response.

pub mod agent;
pub mod builder;
pub mod bus;
pub mod extract;
pub mod host;
pub mod lifecycle;
pub mod storage;
pub mod types;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use agent::PageSyncAgent;
pub use builder::PageSyncAgentBuilder;
pub use bus::{ListenerId, ListenerRegistration, LocalMessageBus, MessageBus, MessageListener, Responder};
pub use extract::DocumentMatcher;
pub use host::{MutationBatch, NavigationSource, PageHost, StaticPage};
pub use lifecycle::{AgentHandle, Lifecycle};
pub use storage::{ExtensionStorage, JsonFileStorage, MemoryStorage, StorageWrite};
pub use types::{AgentError, HostError, StorageError, TransportError};

// Re-export protocol types so hosts never need to import ap-protocol directly.
pub use ap_protocol::{Request, Response, SpreadsheetInfo};
