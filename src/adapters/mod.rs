// Adapters layer: concrete implementations for external systems (http, storage, progress).

pub mod http;
pub mod progress;
pub mod storage;
