//! Command execution and response parsing for external provisioning
//! tools.
//!
//! The pipeline: build an argument line ([`args::build`]), spawn the
//! tool as a child process, capture stdout and stderr to completion,
//! route the captured text through a [`ResponseParser`] for the
//! expected output shape, and hand back a uniform [`CommandResponse`]
//! envelope. Failures of every kind travel through the envelope, so a
//! misbehaving tool never takes the caller down with it.
//!
//! # Example
//!
//! ```no_run
//! # async fn example() {
//! use machine_exec::{ExecutionRequest, ProcessExecutor, SingleLine};
//!
//! let request = ExecutionRequest::new("docker-machine", "status dev");
//! let response = ProcessExecutor::new(request, SingleLine).execute().await;
//! if response.success() {
//!     println!("status: {:?}", response.payload());
//! } else {
//!     eprintln!("{}", response.error_text());
//! }
//! # }
//! ```

pub mod args;
mod executor;
mod parse;
mod response;
mod types;

pub use executor::ProcessExecutor;
pub use parse::{EnvLines, LogText, ParseError, ResponseParser, SingleLine};
pub use response::{CommandResponse, ExecError};
pub use types::{ExecutionRequest, RawOutput};
