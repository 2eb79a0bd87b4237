//! Worker execution for the Amplifier playground bridge
//!
//! One external worker process is started per request. The
//! [`StreamMultiplexer`] relays its `STREAM:` protocol output as typed
//! [`StreamEvent`]s while it runs; the [`BufferedRunner`] waits for it to
//! finish and hands back the collected output.

pub mod buffered;
pub mod error;
pub mod events;
pub mod launcher;
pub mod multiplexer;
pub mod output;
pub mod request;
pub mod worker;

pub use buffered::{BufferedRunner, ExecutionResult};
pub use error::ExecutionError;
pub use events::StreamEvent;
pub use launcher::{EndpointSpec, EnvPolicy, ProcessLauncher, WorkerLauncher};
pub use multiplexer::{Delivery, EventSink, StreamHandle, StreamMultiplexer, StreamOutcome, StreamPhase};
pub use output::{ApplicationError, OutputBuffer, WorkerOutput};
pub use request::ExecutionRequest;
pub use worker::{Termination, WorkerProcess};
