//! Command execution against the fleet manager.

use std::io::Write;

use tracing::debug;

use dockhand_engine::Transport;
use dockhand_fleet::{FleetManager, InstanceRequest};

use crate::cli::{Commands, CreateArgs};
use crate::error::CliError;
use crate::output::{ActionConfirmation, CreatedInstance, InstanceList, LogTail, OutputFormat};

/// Execute one parsed command, writing results to `writer`.
///
/// # Errors
///
/// Returns an error when the operation or output formatting fails.
pub fn dispatch<T, W>(
    manager: &FleetManager<T>,
    command: Commands,
    writer: &mut W,
    format: &OutputFormat,
) -> Result<(), CliError>
where
    T: Transport,
    W: Write,
{
    debug!(?command, "executing command");
    match command {
        Commands::Ps => {
            let instances = manager.list_instances()?;
            format.write(writer, &InstanceList(instances))?;
        }
        Commands::Create(args) => {
            let request = build_request(&args)?;
            let report = manager.create_instance(&request)?;
            format.write(writer, &CreatedInstance::from(&report))?;
        }
        Commands::Start { name } => {
            manager.start_instance(&name)?;
            confirm(writer, format, &name, "started")?;
        }
        Commands::Stop { name } => {
            manager.stop_instance(&name)?;
            confirm(writer, format, &name, "stopped")?;
        }
        Commands::Restart { name } => {
            manager.restart_instance(&name)?;
            confirm(writer, format, &name, "restarted")?;
        }
        Commands::Rm { name } => {
            manager.delete_instance(&name)?;
            confirm(writer, format, &name, "deleted")?;
        }
        Commands::Update { name, memory, cpus } => {
            let report = manager.update_resources(&name, &memory, &cpus)?;
            format.write(writer, &report)?;
        }
        Commands::Resources { name } => {
            let report = manager.instance_resources(&name)?;
            format.write(writer, &report)?;
        }
        Commands::Logs { name, tail } => {
            let lines = manager.instance_logs(&name, tail)?;
            format.write(writer, &LogTail(lines))?;
        }
        Commands::Stats => {
            let stats = manager.fleet_stats()?;
            format.write(writer, &stats)?;
        }
        Commands::Ping => {
            manager.ping()?;
            writeln!(writer, "daemon is reachable")?;
        }
    }
    Ok(())
}

/// Turn the raw create flags into an instance request.
fn build_request(args: &CreateArgs) -> Result<InstanceRequest, CliError> {
    let mut request = InstanceRequest::new();
    for pair in &args.env {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            CliError::InvalidArgument(format!("expected KEY=VALUE, got {pair:?}"))
        })?;
        request = request.with_env(key, value);
    }
    for mapping in &args.port {
        let (container, host) = mapping.split_once(':').ok_or_else(|| {
            CliError::InvalidArgument(format!("expected CONTAINER:HOST, got {mapping:?}"))
        })?;
        let container: u16 = container.parse().map_err(|_| {
            CliError::InvalidArgument(format!("invalid container port in {mapping:?}"))
        })?;
        let host: u16 = host
            .parse()
            .map_err(|_| CliError::InvalidArgument(format!("invalid host port in {mapping:?}")))?;
        request = request.with_port(container, host);
    }
    Ok(request)
}

fn confirm<W: Write>(
    writer: &mut W,
    format: &OutputFormat,
    name: &str,
    action: &str,
) -> Result<(), CliError> {
    format.write(writer, &ActionConfirmation::new(name, action))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_parses_pairs() {
        let args = CreateArgs {
            env: vec!["GEOMETRY=1280x800".to_string()],
            port: vec!["5900:5901".to_string()],
        };
        let request = build_request(&args).expect("valid args");
        assert_eq!(
            request.env,
            vec![("GEOMETRY".to_string(), "1280x800".to_string())]
        );
        assert_eq!(request.ports, vec![(5900, 5901)]);
    }

    #[test]
    fn test_build_request_rejects_malformed() {
        let bad_env = CreateArgs {
            env: vec!["NOEQUALS".to_string()],
            port: Vec::new(),
        };
        assert!(matches!(
            build_request(&bad_env),
            Err(CliError::InvalidArgument(_))
        ));

        let bad_port = CreateArgs {
            env: Vec::new(),
            port: vec!["5900".to_string()],
        };
        assert!(matches!(
            build_request(&bad_port),
            Err(CliError::InvalidArgument(_))
        ));

        let overflow = CreateArgs {
            env: Vec::new(),
            port: vec!["99999:1".to_string()],
        };
        assert!(matches!(
            build_request(&overflow),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
