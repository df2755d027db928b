//! Agent runtime - free-text and structured command handling for employee records
//!
//! Two entry points converge on one executor:
//! - **Conversational façade** (`runtime`) - free text goes through the
//!   extractor (`conversation`) and resolver (`resolver`) before execution
//! - **Tool dispatcher** (`tools`) - structured calls are validated against
//!   the tool catalog and turned directly into typed operations
//!
//! # Key Types
//!
//! - `IntentExtractor` - ordered rule table classifying text into an intent
//! - `OperationResolver` - maps intent and slots to an `Operation` or a clarification
//! - `OperationExecutor` - the only component that writes to the record store
//! - `ToolDispatcher` / `ToolCatalog` - schema-described tool surface
//! - `AgentRuntime` - text in, reply out
//!
//! # Safety Principle
//!
//! Extraction never guesses. A sentence that lacks a required slot is answered
//! with a clarification prompt, and an ambiguous name aborts the mutation.

pub mod conversation;
pub mod executor;
pub mod operation;
pub mod resolver;
pub mod runtime;
pub mod tools;

pub use conversation::{ExtractedEntities, Extraction, Intent, IntentExtractor};
pub use executor::{ExecutionError, OperationExecutor};
pub use operation::{Operation, Outcome};
pub use resolver::{ClarificationNeeded, ClarificationReason, OperationResolver};
pub use runtime::{AgentRuntime, HELP_TEXT};
pub use tools::{
    DispatchError, ParameterKind, ParameterSpec, ToolCatalog, ToolDescriptor, ToolDispatcher,
    ToolKind, ToolResponse,
};
