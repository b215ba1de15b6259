pub mod cdp_document;
pub mod document;
pub mod js_executor;
pub mod memory_document;

pub use cdp_document::CdpDocument;
pub use document::{AttrPattern, AttrQuery, Document, Scope};
pub use js_executor::JsExecutor;
pub use memory_document::{DomTree, ElementSpec, MemoryDocument, Mutation, RecordedEvent};
