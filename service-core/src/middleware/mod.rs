pub mod tracing;

pub use self::tracing::{REQUEST_ID_HEADER, http_trace_layer, request_id, request_id_middleware};
