//! Sioyek command-line sink.
//!
//! Every command runs the host executable once:
//! `sioyek --execute-command <name> [--execute-command-data <text>] --nofocus`

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use super::ScrollSink;
use crate::error::{SinkError, SinkResult};

const MOVE_DOWN: &str = "move_down";
const MOVE_UP: &str = "move_up";
const SET_STATUS: &str = "set_status_string";
const CLEAR_STATUS: &str = "clear_status_string";

/// Strip one leading and one trailing quote character from a launcher-supplied path.
pub fn clean_path(raw: &str) -> &str {
    let path = raw.strip_prefix(['\'', '"']).unwrap_or(raw);
    path.strip_suffix(['\'', '"']).unwrap_or(path)
}

/// Sends commands to a running Sioyek instance through its executable.
#[derive(Debug, Clone)]
pub struct SioyekSink {
    executable: PathBuf,
}

impl SioyekSink {
    pub fn new(target: &str) -> Self {
        Self {
            executable: PathBuf::from(clean_path(target)),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    async fn execute(&self, name: &str, data: Option<&str>) -> SinkResult<()> {
        let mut command = Command::new(&self.executable);
        command.args(["--execute-command", name]);
        if let Some(data) = data {
            command.args(["--execute-command-data", data]);
        }

        let status = command
            .arg("--nofocus")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| SinkError::Spawn {
                command: name.to_string(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(SinkError::CommandFailed {
                command: name.to_string(),
                status: status.to_string(),
            })
        }
    }
}

impl ScrollSink for SioyekSink {
    async fn scroll_forward(&self) -> SinkResult<()> {
        self.execute(MOVE_DOWN, None).await
    }

    async fn scroll_backward(&self) -> SinkResult<()> {
        self.execute(MOVE_UP, None).await
    }

    async fn set_status(&self, text: &str) -> SinkResult<()> {
        self.execute(SET_STATUS, Some(text)).await
    }

    async fn clear_status(&self) -> SinkResult<()> {
        self.execute(CLEAR_STATUS, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("\"/usr/bin/sioyek\""), "/usr/bin/sioyek");
        assert_eq!(clean_path("'/opt/sioyek'"), "/opt/sioyek");
        assert_eq!(clean_path("/plain/path"), "/plain/path");
        assert_eq!(clean_path("\"unbalanced"), "unbalanced");
        assert_eq!(clean_path(""), "");
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_error() {
        let sink = SioyekSink::new("/nonexistent/autoscroll-test/sioyek");
        let err = sink.scroll_forward().await.unwrap_err();
        assert!(matches!(err, SinkError::Spawn { ref command, .. } if command == MOVE_DOWN));
    }

    #[cfg(unix)]
    fn fake_sioyek(name: &str, exit_code: i32) -> (PathBuf, PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join(format!("autoscroll-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let script = dir.join("sioyek");
        let args_log = dir.join("args.log");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\necho \"$@\" >> '{}'\nexit {}\n",
                args_log.display(),
                exit_code
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        (script, args_log)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_commands_reach_executable() {
        let (script, args_log) = fake_sioyek("commands", 0);
        let sink = SioyekSink::new(&format!("\"{}\"", script.display()));
        assert_eq!(sink.executable(), script.as_path());

        sink.set_status("Scrolling...").await.unwrap();
        sink.scroll_forward().await.unwrap();
        sink.scroll_backward().await.unwrap();
        sink.clear_status().await.unwrap();

        let logged = std::fs::read_to_string(&args_log).unwrap();
        let lines: Vec<&str> = logged.lines().collect();
        assert_eq!(
            lines,
            vec![
                "--execute-command set_status_string --execute-command-data Scrolling... --nofocus",
                "--execute-command move_down --nofocus",
                "--execute-command move_up --nofocus",
                "--execute-command clear_status_string --nofocus",
            ]
        );

        let _ = std::fs::remove_dir_all(script.parent().unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_error() {
        let (script, _) = fake_sioyek("failing", 3);
        let sink = SioyekSink::new(script.to_str().unwrap());

        let err = sink.scroll_backward().await.unwrap_err();
        assert!(matches!(err, SinkError::CommandFailed { ref command, .. } if command == MOVE_UP));

        let _ = std::fs::remove_dir_all(script.parent().unwrap());
    }
}
