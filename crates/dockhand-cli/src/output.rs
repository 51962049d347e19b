//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use serde::Serialize;

use dockhand_fleet::{CreateReport, FleetStats, Instance, ResourceReport, StepOutcome};

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Instance list for `ps`.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct InstanceList(pub Vec<Instance>);

impl TableDisplay for InstanceList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.0.is_empty() {
            writeln!(writer, "No instances")?;
            return Ok(());
        }
        writeln!(
            writer,
            "{:<12} {:<16} {:<10} {:<10} {:<10} {:<24} PORTS",
            "ID", "NAME", "STATE", "MEMORY", "CPUS", "IMAGE"
        )?;
        for instance in &self.0 {
            writeln!(
                writer,
                "{:<12} {:<16} {:<10} {:<10} {:<10} {:<24} {}",
                instance.id,
                instance.name,
                instance.state,
                instance.memory,
                instance.cpus,
                instance.image,
                instance.ports.join(", "),
            )?;
        }
        Ok(())
    }
}

/// Create command output.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedInstance {
    /// Allocated instance name.
    pub name: String,
    /// Short container ID.
    pub id: String,
    /// Outcome of the overlay network attach.
    pub network_attach: StepOutcome,
    /// Outcome of the post-create command.
    pub post_create: StepOutcome,
    /// Whether any best-effort step failed.
    pub degraded: bool,
}

impl From<&CreateReport> for CreatedInstance {
    fn from(report: &CreateReport) -> Self {
        Self {
            name: report.name.clone(),
            id: report.id.short().to_string(),
            network_attach: report.network_attach.clone(),
            post_create: report.post_create.clone(),
            degraded: report.degraded(),
        }
    }
}

impl TableDisplay for CreatedInstance {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Created {} ({})", self.name, self.id)?;
        if let StepOutcome::Failed(reason) = &self.network_attach {
            writeln!(writer, "  warning: network attach failed: {reason}")?;
        }
        if let StepOutcome::Failed(reason) = &self.post_create {
            writeln!(writer, "  warning: post-create command failed: {reason}")?;
        }
        Ok(())
    }
}

impl TableDisplay for ResourceReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.name)?;
        writeln!(writer, "  Memory:  {} ({} bytes)", self.memory, self.memory_bytes)?;
        writeln!(writer, "  CPUs:    {} ({} nanocpus)", self.cpus, self.nano_cpus)?;
        Ok(())
    }
}

impl TableDisplay for FleetStats {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Containers")?;
        writeln!(writer, "  Total:    {}", self.total)?;
        writeln!(writer, "  Running:  {}", self.running)?;
        writeln!(writer, "  Stopped:  {}", self.stopped)?;
        writeln!(writer, "  Managed:  {}", self.managed)?;
        Ok(())
    }
}

/// Confirmation for lifecycle commands (start, stop, restart, rm).
#[derive(Debug, Clone, Serialize)]
pub struct ActionConfirmation {
    /// Instance name.
    pub name: String,
    /// Action performed.
    pub status: String,
}

impl ActionConfirmation {
    /// Confirmation that `status` happened to `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
        }
    }
}

impl TableDisplay for ActionConfirmation {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{} {}", self.name, self.status)?;
        Ok(())
    }
}

/// Log tail for `logs`.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct LogTail(pub Vec<String>);

impl TableDisplay for LogTail {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        for line in &self.0 {
            writeln!(writer, "{line}")?;
        }
        Ok(())
    }
}
