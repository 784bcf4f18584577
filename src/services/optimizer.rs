//! External route optimizer
//!
//! The optimizer is an opaque VROOM-compatible batch binary with a JSON
//! file-based request/response contract. It is wrapped behind a capability
//! trait so handlers can run without it and tests can mock it; every
//! invocation is bounded by a hard timeout because the process has no
//! built-in cancellation of its own.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::WorkerError;
use crate::types::OptimizerInput;

#[async_trait]
pub trait RouteOptimizer: Send + Sync {
    /// Produce an assignment for the given jobs/vehicles, or report
    /// unavailability. Unavailability is expected and non-fatal.
    async fn optimize(&self, input: &OptimizerInput) -> Result<serde_json::Value, WorkerError>;
}

/// Optimizer backed by an external VROOM-compatible binary
pub struct VroomOptimizer {
    bin: String,
    timeout: Duration,
}

impl VroomOptimizer {
    pub fn new(bin: String, timeout: Duration) -> Self {
        Self { bin, timeout }
    }

    fn temp_paths() -> (PathBuf, PathBuf) {
        let nonce = uuid::Uuid::new_v4();
        let tmp = std::env::temp_dir();
        (
            tmp.join(format!("vroom_in_{nonce}.json")),
            tmp.join(format!("vroom_out_{nonce}.json")),
        )
    }
}

#[async_trait]
impl RouteOptimizer for VroomOptimizer {
    async fn optimize(&self, input: &OptimizerInput) -> Result<serde_json::Value, WorkerError> {
        let (in_path, out_path) = Self::temp_paths();

        let payload = serde_json::to_vec(input)
            .map_err(|e| WorkerError::OptimizerUnavailable(format!("encode input: {e}")))?;
        tokio::fs::write(&in_path, payload)
            .await
            .map_err(|e| WorkerError::OptimizerUnavailable(format!("write input: {e}")))?;

        // kill_on_drop so a timed-out invocation terminates the child
        // instead of orphaning it
        let run = tokio::process::Command::new(&self.bin)
            .arg("-i")
            .arg(&in_path)
            .arg("-o")
            .arg(&out_path)
            .kill_on_drop(true)
            .output();

        let result = tokio::time::timeout(self.timeout, run).await;

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                cleanup(&in_path, &out_path).await;
                return Err(WorkerError::OptimizerUnavailable(format!(
                    "spawn {}: {e}",
                    self.bin
                )));
            }
            Err(_) => {
                cleanup(&in_path, &out_path).await;
                return Err(WorkerError::OptimizerUnavailable(format!(
                    "timed out after {:?}",
                    self.timeout
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            cleanup(&in_path, &out_path).await;
            return Err(WorkerError::OptimizerUnavailable(format!(
                "exited with {}: {stderr}",
                output.status
            )));
        }

        let raw = tokio::fs::read(&out_path).await;
        cleanup(&in_path, &out_path).await;
        let raw = raw
            .map_err(|e| WorkerError::OptimizerUnavailable(format!("read output: {e}")))?;

        serde_json::from_slice(&raw)
            .map_err(|e| WorkerError::OptimizerUnavailable(format!("parse output: {e}")))
    }
}

async fn cleanup(in_path: &PathBuf, out_path: &PathBuf) {
    let _ = tokio::fs::remove_file(in_path).await;
    let _ = tokio::fs::remove_file(out_path).await;
}

/// Optimizer used when no binary is configured
pub struct NoopOptimizer;

#[async_trait]
impl RouteOptimizer for NoopOptimizer {
    async fn optimize(&self, _input: &OptimizerInput) -> Result<serde_json::Value, WorkerError> {
        Err(WorkerError::OptimizerUnavailable("not configured".into()))
    }
}

/// Create the optimizer from configuration
pub fn create_optimizer(config: &Config) -> Box<dyn RouteOptimizer> {
    match &config.optimizer_bin {
        Some(bin) => {
            info!("External optimizer configured: {}", bin);
            Box::new(VroomOptimizer::new(
                bin.clone(),
                Duration::from_secs(config.optimizer_timeout_secs),
            ))
        }
        None => {
            warn!("VROOM_BIN not set, simulate will return naive stats only");
            Box::new(NoopOptimizer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn write_script(name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = std::env::temp_dir().join(format!("{name}_{}.sh", uuid::Uuid::new_v4()));
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    fn process_gone(pid: u32) -> bool {
        // Absent or zombie both mean the process is no longer running
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Err(_) => true,
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .and_then(|rest| rest.split_whitespace().next())
                .map(|state| state == "Z" || state == "X")
                .unwrap_or(true),
        }
    }

    fn temp_artifacts() -> Vec<String> {
        std::fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("vroom_in_") || n.starts_with("vroom_out_"))
            .collect()
    }

    #[test]
    fn test_noop_optimizer_reports_unavailable() {
        let err = tokio_test::block_on(NoopOptimizer.optimize(&OptimizerInput::default()))
            .unwrap_err();
        assert!(matches!(err, WorkerError::OptimizerUnavailable(_)));
    }

    #[test]
    fn test_missing_binary_reports_unavailable() {
        let optimizer = VroomOptimizer::new(
            "/nonexistent/vroom-binary".into(),
            Duration::from_secs(1),
        );
        let err = tokio_test::block_on(optimizer.optimize(&OptimizerInput::default()))
            .unwrap_err();
        assert!(matches!(err, WorkerError::OptimizerUnavailable(_)));
    }

    #[test]
    #[cfg(unix)]
    fn test_timeout_kills_the_child_process() {
        let pid_file = std::env::temp_dir().join(format!("opt_pid_{}", uuid::Uuid::new_v4()));
        let script = write_script(
            "slow_optimizer",
            &format!("echo $$ > {}\nsleep 30", pid_file.display()),
        );

        let optimizer = VroomOptimizer::new(
            script.to_string_lossy().into_owned(),
            Duration::from_millis(500),
        );
        let err = tokio_test::block_on(optimizer.optimize(&OptimizerInput::default()))
            .unwrap_err();
        assert!(matches!(err, WorkerError::OptimizerUnavailable(_)));

        let pid: u32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        let mut gone = false;
        for _ in 0..40 {
            if process_gone(pid) {
                gone = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(gone, "optimizer process {pid} survived the timeout");

        let _ = std::fs::remove_file(&script);
        let _ = std::fs::remove_file(&pid_file);
    }

    #[test]
    #[cfg(unix)]
    fn test_missing_output_file_cleans_up_temp_files() {
        // Exits successfully without writing the output file, so reading
        // it fails after a clean exit
        let script = write_script("silent_optimizer", "exit 0");
        let before = temp_artifacts();

        let optimizer = VroomOptimizer::new(
            script.to_string_lossy().into_owned(),
            Duration::from_secs(5),
        );
        let err = tokio_test::block_on(optimizer.optimize(&OptimizerInput::default()))
            .unwrap_err();
        assert!(matches!(err, WorkerError::OptimizerUnavailable(_)));

        let after = temp_artifacts();
        let leaked: Vec<_> = after.iter().filter(|n| !before.contains(n)).collect();
        assert!(leaked.is_empty(), "temp files left behind: {leaked:?}");

        let _ = std::fs::remove_file(&script);
    }
}
