use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

const UNKNOWN: &str = "unknown";

/// Resolve the current HEAD commit of the workspace, or `"unknown"`.
///
/// This is the one subprocess boundary left in the tool, so the contract
/// is explicit: a wall-clock timeout bounds the call, expiry kills the
/// child and counts as a hard failure of the lookup. Never retried.
pub fn git_head(root: &Path, timeout: Duration) -> String {
    let spawned = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(root)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn();
    let Ok(mut child) = spawned else {
        return UNKNOWN.to_string();
    };

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    return UNKNOWN.to_string();
                }
                let mut out = String::new();
                if let Some(mut stdout) = child.stdout.take() {
                    if stdout.read_to_string(&mut out).is_err() {
                        return UNKNOWN.to_string();
                    }
                }
                let head = out.trim();
                return if head.is_empty() {
                    UNKNOWN.to_string()
                } else {
                    head.to_string()
                };
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    debug!("git rev-parse timed out");
                    let _ = child.kill();
                    let _ = child.wait();
                    return UNKNOWN.to_string();
                }
                thread::sleep(Duration::from_millis(10));
            }
            Err(_) => return UNKNOWN.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_repository_yields_unknown() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(git_head(dir.path(), Duration::from_secs(5)), "unknown");
    }
}
