//! Middleware shared by the service router.

pub mod request_id;

// Re-export commonly used types
pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
