//! Logging abstractions
//!
//! Components take an `Arc<dyn Logger>`; the binary plugs in `TracingLogger`,
//! tests plug in `NoOpLogger`.

mod traits;
mod noop;
mod tracing_logger;

pub use traits::Logger;
pub use noop::NoOpLogger;
pub use tracing_logger::TracingLogger;
