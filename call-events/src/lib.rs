//! Call Events Crate
//!
//! Ingests lifecycle callbacks for outbound screening calls placed by the voice
//! provider and keeps call records and campaign candidates in sync with them.
//!
//! # Architecture
//!
//! - **Types**: records and wire payloads live in the `shared-types` crate
//! - **Decoding**: `decode` turns a webhook body into a typed [`CallEvent`]
//! - **Processing**: [`CallEventProcessor`] applies one event through a [`CallStore`]
//!
//! Delivery is at-least-once and unordered, so every transition is idempotent
//! and terminal call states are sticky.
//!
//! # Example
//!
//! ```rust,ignore
//! use call_events::{decode, CallEventProcessor, MemoryCallStore};
//!
//! let processor = CallEventProcessor::new(MemoryCallStore::new());
//! let event = decode::decode_body(body, chrono::Utc::now().timestamp())?;
//! let result = processor.process_event(&event)?;
//! ```

pub mod decode;
pub mod error;
pub mod event;
pub mod outcome;
pub mod processor;
pub mod storage;
pub mod transition;

pub use error::CallEventError;
pub use event::{CallAnalysis, CallEvent, CallEventKind, ScreeningAnswers};
pub use outcome::CandidateOutcomePolicy;
pub use processor::CallEventProcessor;
pub use storage::{CallStore, MemoryCallStore, NewCallAnalysis};
pub use transition::CallRecordUpdate;
