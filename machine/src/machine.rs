use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use machine_exec::{
    CommandResponse, EnvLines, ExecError, ExecutionRequest, LogText, ProcessExecutor,
    ResponseParser, SingleLine, args,
};
use tracing::debug;
use url::Url;

use crate::driver::{MachineResources, ResourceDriver};
use crate::error::{MachineError, Result};
use crate::inspect::{InspectParser, MachineConfig};
use crate::list::{ListParser, MachineListEntry};
use crate::state::RunningState;

/// Row template handed to the tool's `ls` so each machine prints as
/// `name;state;url` on its own line.
const LS_FORMAT: &str = "--format=\"{{.Name}};{{.State}};{{.URL}}\"";

/// Exact phrase the tool prints for a `url` query against a machine that
/// is not running. A versioned contract with the tool: if its wording
/// changes, detection silently stops matching and the caller sees a
/// malformed-url error instead of `None`.
const HOST_NOT_RUNNING: &str = "Host is not running";

/// Typed operations over a `docker-machine`-compatible provisioning
/// binary.
///
/// Holds only immutable per-instance configuration; every operation
/// spawns its own child process and owns its own buffers, so one value
/// can serve concurrent callers without shared mutable state.
#[derive(Debug, Clone)]
pub struct Machine {
    binary: PathBuf,
    timeout: Option<Duration>,
    driver: ResourceDriver,
}

impl Machine {
    /// Operate on the tool at `binary`. Locating the binary — PATH
    /// lookup, install checks — is the caller's concern.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
            driver: ResourceDriver::default(),
        }
    }

    /// Kill any tool invocation still running after `limit` and fail its
    /// envelope. Off by default; create can legitimately run for minutes.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Driver used by
    /// [`create_with_resources`](Self::create_with_resources).
    pub fn resource_driver(mut self, driver: ResourceDriver) -> Self {
        self.driver = driver;
        self
    }

    /// List all machines the tool knows about, in its own output order.
    pub async fn ls(&self) -> CommandResponse<Vec<MachineListEntry>> {
        self.run(args::build("ls", &[LS_FORMAT], None), ListParser)
            .await
    }

    /// Full configuration document for one machine.
    pub async fn inspect(&self, name: &str) -> CommandResponse<MachineConfig> {
        self.run(args::build("inspect", &[], Some(name)), InspectParser)
            .await
    }

    /// Start a stopped machine; the payload is the tool's progress log.
    pub async fn start(&self, name: &str) -> CommandResponse<String> {
        self.run(args::build("start", &[], Some(name)), LogText)
            .await
    }

    /// Stop a running machine.
    pub async fn stop(&self, name: &str) -> CommandResponse<String> {
        self.run(args::build("stop", &[], Some(name)), LogText).await
    }

    /// Remove a machine without prompting. `force` adds the tool's force
    /// option ahead of the machine name. Whether removing an absent
    /// machine is an error is the tool's decision, surfaced verbatim.
    pub async fn rm(&self, name: &str, force: bool) -> CommandResponse<String> {
        let options: &[&str] = if force { &["-y", "-f"] } else { &["-y"] };
        self.run(args::build("rm", options, Some(name)), LogText)
            .await
    }

    /// Create a machine with an explicit driver and raw passthrough
    /// options, handed to the tool between the driver and the name.
    pub async fn create(
        &self,
        name: &str,
        driver: &str,
        options: &[&str],
    ) -> CommandResponse<String> {
        let mut opts: Vec<&str> = vec!["-d", driver];
        opts.extend_from_slice(options);
        self.run(args::build("create", &opts, Some(name)), LogText)
            .await
    }

    /// Create a machine from numeric resources through the configured
    /// driver. Extra options are appended after the rendered resource
    /// flags, same as the raw overload would receive them.
    pub async fn create_with_resources(
        &self,
        name: &str,
        resources: &MachineResources,
        options: &[&str],
    ) -> CommandResponse<String> {
        let rendered = self.driver.options(resources);
        let mut opts: Vec<&str> = rendered.iter().map(String::as_str).collect();
        opts.extend_from_slice(options);
        self.create(name, self.driver.name(), &opts).await
    }

    /// Environment variables a client shell needs to talk to the
    /// machine's daemon.
    pub async fn env(&self, name: &str) -> CommandResponse<HashMap<String, String>> {
        self.run(args::build("env", &[], Some(name)), EnvLines).await
    }

    /// Connection URL for a machine, or `None` when the tool reports the
    /// machine is not running — a documented non-error outcome the tool
    /// delivers through a zero or nonzero exit depending on version.
    pub async fn url(&self, name: &str) -> Result<Option<Url>> {
        let response = self.run(args::build("url", &[], Some(name)), SingleLine).await;
        let url = translate_url(response)?;
        if url.is_none() {
            debug!(machine = %name, "machine not running, no url");
        }
        Ok(url)
    }

    /// Liveness classification. Total: an unrecognized status word and a
    /// failed execution both classify as [`RunningState::Unknown`], never
    /// an error.
    pub async fn status(&self, name: &str) -> RunningState {
        let response = self.run(args::build("status", &[], Some(name)), SingleLine).await;
        match response.into_result() {
            Ok(line) => RunningState::classify(&line),
            Err(error) => {
                debug!(machine = %name, %error, "status query failed");
                RunningState::Unknown
            }
        }
    }

    async fn run<P: ResponseParser>(
        &self,
        arg_line: String,
        parser: P,
    ) -> CommandResponse<P::Output> {
        let mut request = ExecutionRequest::new(&self.binary, arg_line);
        if let Some(limit) = self.timeout {
            request = request.timeout(limit);
        }
        ProcessExecutor::new(request, parser).execute().await
    }
}

fn translate_url(response: CommandResponse<String>) -> Result<Option<Url>> {
    match response.into_result() {
        Ok(line) if line.starts_with(HOST_NOT_RUNNING) => Ok(None),
        Ok(line) => Url::parse(&line)
            .map(Some)
            .map_err(|source| MachineError::InvalidUrl { text: line, source }),
        // Some tool versions report a stopped machine through a nonzero
        // exit with the same phrase, wrapped in their own error framing.
        Err(ExecError::Exit { ref error_text, .. }) if error_text.contains(HOST_NOT_RUNNING) => {
            Ok(None)
        }
        Err(error) => Err(error.into()),
    }
}
