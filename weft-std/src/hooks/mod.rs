//! General purpose interceptors.

mod logging;

pub use logging::{Instrumented, LoggingInterceptor};
