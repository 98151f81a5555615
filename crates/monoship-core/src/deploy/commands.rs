//! Orchestrator commands issued over the remote session.

use std::collections::BTreeSet;

use crate::image::ImageRef;
use crate::manifest::DeployOptions;
use crate::remote::RemoteCommand;

/// Restart policy applied to every created service.
pub const RESTART_CONDITION: &str = "any";
/// Scheduling mode applied to every created service.
pub const SERVICE_MODE: &str = "replicated";

/// `docker service ls` printing `<id> <name>` per line.
pub fn list_services_command() -> RemoteCommand {
    RemoteCommand::new("docker").args(["service", "ls", "--format", "{{.ID}} {{.Name}}"])
}

/// Service names from list output: the second whitespace-separated token of each line.
pub fn parse_service_list<S: AsRef<str>>(lines: &[S]) -> BTreeSet<String> {
    lines
        .iter()
        .filter_map(|line| line.as_ref().split_whitespace().nth(1))
        .map(str::to_string)
        .collect()
}

pub fn update_command(service: &str, image: &ImageRef) -> RemoteCommand {
    RemoteCommand::new("docker").args([
        "service".to_string(),
        "update".to_string(),
        "--image".to_string(),
        image.to_string(),
        service.to_string(),
    ])
}

/// `docker service create` with the manifest's options as `--key=value` flags.
///
/// Fails when an option key is not a plain flag name.
pub fn create_command(
    service: &str,
    network: &str,
    image: &ImageRef,
    options: &DeployOptions,
) -> Result<RemoteCommand, String> {
    let mut command = RemoteCommand::new("docker").args([
        "service",
        "create",
        "--name",
        service,
        "--network",
        network,
        "--restart-condition",
        RESTART_CONDITION,
        "--mode",
        SERVICE_MODE,
    ]);

    for (key, value) in options.flags() {
        if !is_flag_name(key) {
            return Err(format!("invalid deploy option name '{}'", key));
        }
        command = command.arg(format!("--{}={}", key, value));
    }

    Ok(command.arg(image.to_string()))
}

fn is_flag_name(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}
