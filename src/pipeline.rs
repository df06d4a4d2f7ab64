//! Azure Pipelines logging commands
//!
//! The agent scans stdout for `##vso[...]` lines; these helpers format them.

use std::fmt;
use std::path::Path;

/// Artifact name SARIF results are published under by default
pub const DEFAULT_ARTIFACT_NAME: &str = "CodeAnalysisLogs";

/// A single `##vso[area.action properties]data` logging command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingCommand {
    area_action: &'static str,
    properties: Vec<(&'static str, String)>,
    data: String,
}

impl LoggingCommand {
    /// `##vso[task.setvariable variable=NAME]value`
    pub fn set_variable(name: &str, value: &str) -> Self {
        Self {
            area_action: "task.setvariable",
            properties: vec![("variable", name.to_string())],
            data: value.to_string(),
        }
    }

    /// `##vso[artifact.upload artifactname=NAME]path`
    pub fn upload_artifact(artifact_name: &str, path: &Path) -> Self {
        Self {
            area_action: "artifact.upload",
            properties: vec![("artifactname", artifact_name.to_string())],
            data: path.display().to_string(),
        }
    }

    /// `##vso[task.complete result=Failed;]message`
    pub fn fail_task(message: &str) -> Self {
        Self {
            area_action: "task.complete",
            properties: vec![("result", "Failed".to_string())],
            data: message.to_string(),
        }
    }

    /// Write the command to stdout
    pub fn emit(&self) {
        println!("{}", self);
    }
}

impl fmt::Display for LoggingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "##vso[{}", self.area_action)?;
        for (i, (key, value)) in self.properties.iter().enumerate() {
            let sep = if i == 0 { ' ' } else { ';' };
            write!(f, "{}{}={}", sep, key, escape_property(value))?;
        }
        if self.area_action == "task.complete" {
            f.write_str(";")?;
        }
        write!(f, "]{}", escape_data(&self.data))
    }
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%AZP25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(']', "%5D").replace(';', "%3B")
}
