use machine_exec::{ParseError, RawOutput, ResponseParser};
use serde::Serialize;

use crate::state::RunningState;

/// One row of the machine listing, fields verbatim from the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineListEntry {
    pub name: String,
    pub state: String,
    pub url: String,
}

impl MachineListEntry {
    /// Classify the raw state column text.
    pub fn running_state(&self) -> RunningState {
        RunningState::classify(&self.state)
    }
}

/// Parses `name;state;url` rows, one machine per line, preserving the
/// tool's own ordering. Lines that do not split into exactly three
/// fields — trailing blanks included — are skipped, not fatal, so an
/// empty listing parses to an empty vector.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListParser;

impl ResponseParser for ListParser {
    type Output = Vec<MachineListEntry>;

    fn parse(&self, raw: &RawOutput) -> Result<Self::Output, ParseError> {
        let mut entries = Vec::new();
        for line in raw.stdout_lines() {
            let mut fields = line.trim().split(';');
            if let (Some(name), Some(state), Some(url), None) =
                (fields.next(), fields.next(), fields.next(), fields.next())
            {
                entries.push(MachineListEntry {
                    name: name.to_owned(),
                    state: state.to_owned(),
                    url: url.to_owned(),
                });
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(stdout: &str) -> RawOutput {
        RawOutput {
            exit_code: 0,
            stdout: stdout.to_owned(),
            stderr: String::new(),
        }
    }

    #[test]
    fn rows_parse_in_tool_order() {
        let listing = "dev;Running;tcp://192.168.99.100:2376\nci;Stopped;\n";
        let entries = ListParser.parse(&raw(listing)).unwrap();
        assert_eq!(
            entries,
            vec![
                MachineListEntry {
                    name: "dev".to_owned(),
                    state: "Running".to_owned(),
                    url: "tcp://192.168.99.100:2376".to_owned(),
                },
                MachineListEntry {
                    name: "ci".to_owned(),
                    state: "Stopped".to_owned(),
                    url: String::new(),
                },
            ]
        );
    }

    #[test]
    fn wrong_arity_lines_are_skipped() {
        let listing = "\n\
                       dev;Running;tcp://h:1\n\
                       malformed row without separators\n\
                       too;many;fields;here\n\
                       short;row\n";
        let entries = ListParser.parse(&raw(listing)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.first().map(|e| e.name.as_str()), Some("dev"));
    }

    #[test]
    fn empty_listing_is_an_empty_vector() {
        let entries = ListParser.parse(&raw("")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn entry_state_classifies() {
        let entries = ListParser.parse(&raw("dev;Saved;\n")).unwrap();
        assert_eq!(
            entries.first().map(MachineListEntry::running_state),
            Some(RunningState::Unknown)
        );
    }
}
