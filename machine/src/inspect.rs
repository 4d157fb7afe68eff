use machine_exec::{ParseError, RawOutput, ResponseParser};
use serde_json::Value;

/// Parsed `inspect` document for one machine.
///
/// The document is kept whole: well-known fields get typed accessors,
/// and everything else — including fields added by newer tool versions —
/// stays reachable through [`field`](Self::field), unknown keys
/// preserved verbatim.
#[derive(Debug, Clone)]
pub struct MachineConfig {
    document: serde_json::Map<String, Value>,
}

impl MachineConfig {
    pub fn name(&self) -> Option<&str> {
        self.str_field("Name")
    }

    pub fn driver_name(&self) -> Option<&str> {
        self.str_field("DriverName")
    }

    /// IP address reported under the driver section, when present and
    /// non-empty.
    pub fn ip_address(&self) -> Option<&str> {
        self.field("Driver.IPAddress")
            .and_then(Value::as_str)
            .filter(|ip| !ip.is_empty())
    }

    /// Memory allocation in MB, as the driver reports it.
    pub fn memory_mb(&self) -> Option<u64> {
        self.field("Driver.Memory").and_then(Value::as_u64)
    }

    /// Disk allocation in MB, as the driver reports it.
    pub fn disk_size_mb(&self) -> Option<u64> {
        self.field("Driver.DiskSize").and_then(Value::as_u64)
    }

    /// CPU count, as the driver reports it.
    pub fn cpu_count(&self) -> Option<u64> {
        self.field("Driver.CPU").and_then(Value::as_u64)
    }

    /// Look up an arbitrary field by dotted path, e.g. `Driver.SSHPort`
    /// or `HostOptions.EngineOptions.TlsVerify`.
    pub fn field(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.document.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// The whole document, for serialization or exhaustive walks.
    pub fn document(&self) -> &serde_json::Map<String, Value> {
        &self.document
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.document.get(key).and_then(Value::as_str)
    }
}

/// Parses the structured document `inspect` prints for one machine.
/// Anything other than a single well-formed top-level object is a
/// failure; a machine always has a configuration, so there is no empty
/// success case.
#[derive(Debug, Default, Clone, Copy)]
pub struct InspectParser;

impl ResponseParser for InspectParser {
    type Output = MachineConfig;

    fn parse(&self, raw: &RawOutput) -> Result<MachineConfig, ParseError> {
        let text = raw.stdout.trim();
        if text.is_empty() {
            return Err(ParseError::EmptyOutput);
        }
        let document = serde_json::from_str(text).map_err(|e| ParseError::Malformed {
            shape: "inspect document",
            detail: e.to_string(),
        })?;
        Ok(MachineConfig { document })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "ConfigVersion": 3,
        "Name": "dev",
        "DriverName": "virtualbox",
        "Driver": {
            "IPAddress": "192.168.99.100",
            "SSHPort": 55831,
            "Memory": 2048,
            "DiskSize": 20000,
            "CPU": 2
        },
        "HostOptions": {
            "EngineOptions": { "TlsVerify": true }
        }
    }"#;

    fn raw(stdout: &str) -> RawOutput {
        RawOutput {
            exit_code: 0,
            stdout: stdout.to_owned(),
            stderr: String::new(),
        }
    }

    #[test]
    fn well_known_fields_have_typed_accessors() {
        let config = InspectParser.parse(&raw(DOC)).unwrap();
        assert_eq!(config.name(), Some("dev"));
        assert_eq!(config.driver_name(), Some("virtualbox"));
        assert_eq!(config.ip_address(), Some("192.168.99.100"));
        assert_eq!(config.memory_mb(), Some(2048));
        assert_eq!(config.disk_size_mb(), Some(20000));
        assert_eq!(config.cpu_count(), Some(2));
    }

    #[test]
    fn dotted_paths_reach_nested_fields() {
        let config = InspectParser.parse(&raw(DOC)).unwrap();
        assert_eq!(
            config.field("Driver.Memory").and_then(Value::as_u64),
            Some(2048)
        );
        assert_eq!(
            config
                .field("HostOptions.EngineOptions.TlsVerify")
                .and_then(Value::as_bool),
            Some(true)
        );
        assert!(config.field("Driver.NoSuchKey").is_none());
        assert!(config.field("NoSuchSection.Whatever").is_none());
    }

    #[test]
    fn unknown_keys_survive_verbatim() {
        let config = InspectParser
            .parse(&raw(r#"{"Name":"m1","FutureField":{"a":1}}"#))
            .unwrap();
        assert_eq!(
            config.field("FutureField.a").and_then(Value::as_u64),
            Some(1)
        );
        assert!(config.document().contains_key("FutureField"));
    }

    #[test]
    fn empty_ip_address_reads_as_absent() {
        let config = InspectParser
            .parse(&raw(r#"{"Driver":{"IPAddress":""}}"#))
            .unwrap();
        assert_eq!(config.ip_address(), None);
    }

    #[test]
    fn non_document_output_is_malformed() {
        assert!(matches!(
            InspectParser.parse(&raw("")),
            Err(ParseError::EmptyOutput)
        ));
        assert!(matches!(
            InspectParser.parse(&raw("not json at all")),
            Err(ParseError::Malformed { .. })
        ));
        assert!(matches!(
            InspectParser.parse(&raw("[1, 2, 3]")),
            Err(ParseError::Malformed { .. })
        ));
    }
}
