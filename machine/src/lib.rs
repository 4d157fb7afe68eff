//! Typed operations over a `docker-machine`-compatible provisioning
//! tool.
//!
//! Each operation builds an argument line, runs the tool as a child
//! process, and parses its text output into a typed result delivered
//! through a uniform [`CommandResponse`] envelope, so callers branch on
//! one success flag instead of scraping text. The lifecycle operations
//! (`create`, `start`, `stop`, `rm`) return the tool's progress log
//! verbatim; the query operations (`ls`, `inspect`, `env`, `url`,
//! `status`) return structured payloads.
//!
//! # Example
//!
//! ```no_run
//! # async fn example() -> Result<(), machine::MachineError> {
//! use machine::{Machine, RunningState};
//!
//! let tool = Machine::new("/usr/local/bin/docker-machine");
//! if tool.status("dev").await == RunningState::Running {
//!     if let Some(url) = tool.url("dev").await? {
//!         println!("dev listens on {url}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod driver;
mod error;
mod inspect;
mod list;
mod machine;
mod state;

pub use machine_exec::{CommandResponse, ExecError, ParseError};

pub use driver::{MachineResources, ResourceDriver};
pub use error::{MachineError, Result};
pub use inspect::{InspectParser, MachineConfig};
pub use list::{ListParser, MachineListEntry};
pub use machine::Machine;
pub use state::RunningState;
