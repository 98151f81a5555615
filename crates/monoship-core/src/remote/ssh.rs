//! OpenSSH-backed remote sessions.
//!
//! `connect` starts a control master (`ssh -M -N -f`) on a private socket;
//! every `exec` is multiplexed over that socket and `close` asks the master
//! to exit. Password logins go through `sshpass -e` so the secret travels in
//! the environment, private keys are written to a 0600 file that lives as
//! long as the session.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use crate::process::{self, CommandSpec};

use super::{
    ExecOutput, RemoteAuth, RemoteCommand, RemoteError, RemoteExecutor, RemoteSession,
    RemoteTarget,
};

#[derive(Debug, Clone)]
pub struct SshExecutor {
    timeout: Duration,
}

impl SshExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

pub struct SshSession {
    destination: String,
    port: u16,
    socket: PathBuf,
    timeout: Duration,
    // Holds the control socket and key file; removed on drop.
    _workdir: TempDir,
}

impl RemoteExecutor for SshExecutor {
    type Session = SshSession;

    async fn connect(&self, target: &RemoteTarget) -> Result<SshSession, RemoteError> {
        let destination = target.destination();
        let connect_error = |detail: String| RemoteError::Connect {
            destination: destination.clone(),
            detail,
        };

        let workdir = tempfile::Builder::new()
            .prefix("monoship-ssh")
            .tempdir()
            .map_err(|e| connect_error(format!("cannot create session directory: {}", e)))?;
        let socket = workdir.path().join("ctl");

        let log = workdir.path().join("master.log");
        let spec = master_command(target, &socket, workdir.path())
            .map_err(|e| connect_error(format!("cannot prepare credentials: {}", e)))?;

        tracing::info!(destination = %destination, port = target.port, "Opening remote session");
        let output = process::run(&spec, self.timeout)
            .await
            .map_err(|e| connect_error(e.to_string()))?;
        if !output.success() {
            let logged = std::fs::read_to_string(&log).unwrap_or_default();
            let detail = match logged.trim() {
                "" => output.failure_detail(),
                logged => format!("{}: {}", output.failure_detail(), logged),
            };
            return Err(connect_error(detail));
        }

        Ok(SshSession {
            destination,
            port: target.port,
            socket,
            timeout: self.timeout,
            _workdir: workdir,
        })
    }
}

impl SshSession {
    fn client_command(&self) -> CommandSpec {
        CommandSpec::new("ssh").args([
            "-o".to_string(),
            format!("ControlPath={}", self.socket.display()),
            "-o".to_string(),
            "ControlMaster=no".to_string(),
            "-p".to_string(),
            self.port.to_string(),
        ])
    }
}

impl RemoteSession for SshSession {
    async fn exec(&mut self, command: &RemoteCommand) -> Result<ExecOutput, RemoteError> {
        let rendered = command.render();
        let spec = self
            .client_command()
            .arg(self.destination.clone())
            .arg("--")
            .arg(rendered.clone());

        let output = process::run(&spec, self.timeout)
            .await
            .map_err(|e| RemoteError::Exec {
                command: rendered,
                detail: e.to_string(),
            })?;

        Ok(ExecOutput {
            exit_code: output.code,
            stdout: output.stdout.lines().map(str::to_string).collect(),
            stderr: output.stderr.lines().map(str::to_string).collect(),
        })
    }

    async fn close(self) -> Result<(), RemoteError> {
        let spec = self
            .client_command()
            .args(["-O", "exit"])
            .arg(self.destination.clone());

        let output = process::run(&spec, self.timeout)
            .await
            .map_err(|e| RemoteError::Close {
                destination: self.destination.clone(),
                detail: e.to_string(),
            })?;
        if !output.success() {
            return Err(RemoteError::Close {
                destination: self.destination.clone(),
                detail: output.failure_detail(),
            });
        }
        tracing::debug!(destination = %self.destination, "Remote session closed");
        Ok(())
    }
}

fn master_command(
    target: &RemoteTarget,
    socket: &Path,
    workdir: &Path,
) -> std::io::Result<CommandSpec> {
    let mut ssh_args = vec![
        "-M".to_string(),
        "-N".to_string(),
        "-f".to_string(),
        "-o".to_string(),
        format!("ControlPath={}", socket.display()),
        "-o".to_string(),
        "ControlPersist=yes".to_string(),
        "-o".to_string(),
        "StrictHostKeyChecking=accept-new".to_string(),
        "-o".to_string(),
        "ServerAliveInterval=30".to_string(),
        "-E".to_string(),
        workdir.join("master.log").display().to_string(),
        "-p".to_string(),
        target.port.to_string(),
    ];

    let spec = match &target.auth {
        RemoteAuth::PrivateKey(key) => {
            let key_path = write_private_key(workdir, key.expose())?;
            ssh_args.extend([
                "-i".to_string(),
                key_path.display().to_string(),
                "-o".to_string(),
                "IdentitiesOnly=yes".to_string(),
                "-o".to_string(),
                "BatchMode=yes".to_string(),
            ]);
            ssh_args.push(target.destination());
            CommandSpec::new("ssh").args(ssh_args).discard_output()
        }
        RemoteAuth::Password(password) => {
            ssh_args.extend([
                "-o".to_string(),
                "PubkeyAuthentication=no".to_string(),
                "-o".to_string(),
                "PreferredAuthentications=password,keyboard-interactive".to_string(),
            ]);
            ssh_args.push(target.destination());
            CommandSpec::new("sshpass")
                .args(["-e", "ssh"])
                .args(ssh_args)
                .env("SSHPASS", password.expose())
                .discard_output()
        }
    };
    Ok(spec)
}

fn write_private_key(workdir: &Path, key: &str) -> std::io::Result<PathBuf> {
    let path = workdir.join("id");
    let mut content = key.trim().to_string();
    content.push('\n');

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(&path)?;
    std::io::Write::write_all(&mut file, content.as_bytes())?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use crate::config::Secret;

    use super::*;

    fn target(auth: RemoteAuth) -> RemoteTarget {
        RemoteTarget {
            host: "swarm.internal".to_string(),
            port: 2222,
            username: "deploy".to_string(),
            auth,
        }
    }

    #[test]
    fn password_never_reaches_argv() {
        let dir = TempDir::new().unwrap();
        let spec = master_command(
            &target(RemoteAuth::Password(Secret::new("hunter2"))),
            &dir.path().join("ctl"),
            dir.path(),
        )
        .unwrap();

        assert_eq!(spec.program(), "sshpass");
        assert!(!spec.to_string().contains("hunter2"));
        assert!(spec.to_string().ends_with("deploy@swarm.internal"));
    }

    #[test]
    fn private_key_is_written_to_session_dir() {
        let dir = TempDir::new().unwrap();
        let spec = master_command(
            &target(RemoteAuth::PrivateKey(Secret::new("-----BEGIN KEY-----"))),
            &dir.path().join("ctl"),
            dir.path(),
        )
        .unwrap();

        let key_path = dir.path().join("id");
        assert_eq!(spec.program(), "ssh");
        assert!(spec.get_args().contains(&key_path.display().to_string()));
        assert_eq!(
            std::fs::read_to_string(&key_path).unwrap(),
            "-----BEGIN KEY-----\n"
        );
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&key_path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
