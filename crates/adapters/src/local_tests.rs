// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::target::StdioMode;
use std::time::Duration;
use tempfile::TempDir;

fn target() -> LocalTarget {
    LocalTarget::new(TargetMetadata::new("linux", "x86_64"))
}

fn sh(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}

#[tokio::test]
async fn run_reports_exit_code_and_output() {
    let mut proc = target()
        .run(&sh("echo out; echo err >&2; exit 3"), RunOptions::piped(Duration::from_secs(5)))
        .await
        .unwrap();
    assert!(proc.id().is_some());

    match proc.wait().await.unwrap() {
        ProcessExit::Exited { returncode, stdout, stderr } => {
            assert_eq!(returncode, ReturnCode(3));
            assert_eq!(stdout, b"out\n");
            assert_eq!(stderr, b"err\n");
        }
        other => panic!("unexpected exit: {:?}", other),
    }
}

#[tokio::test]
async fn run_reports_signal_as_negative() {
    let mut proc = target()
        .run(&sh("kill -SEGV $$"), RunOptions::piped(Duration::from_secs(5)))
        .await
        .unwrap();
    match proc.wait().await.unwrap() {
        ProcessExit::Exited { returncode, .. } => assert_eq!(returncode, ReturnCode(-11)),
        other => panic!("unexpected exit: {:?}", other),
    }
}

#[tokio::test]
async fn wait_times_out_and_kills() {
    let mut proc = target()
        .run(&sh("sleep 5"), RunOptions::piped(Duration::from_millis(100)))
        .await
        .unwrap();
    let start = std::time::Instant::now();
    assert_eq!(proc.wait().await.unwrap(), ProcessExit::TimedOut);
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn stdin_is_forwarded_and_closed() {
    let mut proc = target()
        .run(&["cat".to_string()], RunOptions::piped(Duration::from_secs(5)))
        .await
        .unwrap();
    proc.write_stdin(b"hello ").await.unwrap();
    proc.write_stdin(b"world").await.unwrap();
    proc.close_stdin();
    assert!(matches!(proc.write_stdin(b"late").await, Err(TargetError::StdinClosed)));

    match proc.wait().await.unwrap() {
        ProcessExit::Exited { returncode, stdout, .. } => {
            assert!(returncode.success());
            assert_eq!(stdout, b"hello world");
        }
        other => panic!("unexpected exit: {:?}", other),
    }
}

#[tokio::test]
async fn large_echo_does_not_stall_on_full_pipes() {
    let mut proc = target()
        .run(&["cat".to_string()], RunOptions::piped(Duration::from_secs(10)))
        .await
        .unwrap();
    let input = vec![b'A'; 1 << 20];
    proc.write_stdin(&input).await.unwrap();

    match proc.wait().await.unwrap() {
        ProcessExit::Exited { returncode, stdout, .. } => {
            assert!(returncode.success());
            assert_eq!(stdout.len(), input.len());
        }
        other => panic!("unexpected exit: {:?}", other),
    }
}

#[tokio::test]
async fn stdin_write_is_bounded_by_deadline() {
    let mut proc = target()
        .run(&sh("sleep 5"), RunOptions::piped(Duration::from_millis(200)))
        .await
        .unwrap();
    let start = std::time::Instant::now();

    let result = proc.write_stdin(&vec![b'A'; 1 << 20]).await;
    assert!(matches!(result, Err(TargetError::StdinClosed)));
    assert!(matches!(proc.write_stdin(b"more").await, Err(TargetError::StdinClosed)));
    assert_eq!(proc.wait().await.unwrap(), ProcessExit::TimedOut);
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn output_held_open_by_grandchild_times_out() {
    // The background sleep inherits stdout and outlives the shell
    let mut proc = target()
        .run(&sh("sleep 5 & exit 0"), RunOptions::piped(Duration::from_millis(200)))
        .await
        .unwrap();
    let start = std::time::Instant::now();
    assert_eq!(proc.wait().await.unwrap(), ProcessExit::TimedOut);
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn second_wait_is_an_error() {
    let mut proc =
        target().run(&sh("true"), RunOptions::piped(Duration::from_secs(5))).await.unwrap();
    proc.wait().await.unwrap();
    assert!(matches!(proc.wait().await, Err(TargetError::AlreadyWaited)));
}

#[tokio::test]
async fn declared_env_is_applied() {
    let target = LocalTarget::new(
        TargetMetadata::new("linux", "x86_64").env(vec!["EMUTRACE_TEST_VAR=42".to_string()]),
    );
    let opts = RunOptions { stderr: StdioMode::Null, ..RunOptions::piped(Duration::from_secs(5)) };
    let mut proc = target.run(&sh("printf %s \"$EMUTRACE_TEST_VAR\""), opts).await.unwrap();
    match proc.wait().await.unwrap() {
        ProcessExit::Exited { stdout, stderr, .. } => {
            assert_eq!(stdout, b"42");
            assert!(stderr.is_empty());
        }
        other => panic!("unexpected exit: {:?}", other),
    }
}

#[tokio::test]
async fn empty_command_is_rejected() {
    let result = target().run(&[], RunOptions::piped(Duration::from_secs(1))).await;
    assert!(matches!(result, Err(TargetError::EmptyCommand)));
}

#[tokio::test]
async fn missing_program_is_spawn_error() {
    let missing = vec!["/nonexistent/emutrace-launcher".to_string()];
    let result = target().run(&missing, RunOptions::piped(Duration::from_secs(1))).await;
    assert!(matches!(result, Err(TargetError::Spawn { .. })));
}

#[tokio::test]
async fn resolve_glob_is_sorted() {
    let dir = TempDir::new().unwrap();
    for name in ["qemu_9.core", "qemu_1.core", "other.txt"] {
        std::fs::write(dir.path().join(name), b"x").unwrap();
    }
    let pattern = format!("{}/qemu_*.core", dir.path().display());
    let matches = target().resolve_glob(&pattern).await.unwrap();
    assert_eq!(
        matches,
        vec![
            format!("{}/qemu_1.core", dir.path().display()),
            format!("{}/qemu_9.core", dir.path().display()),
        ]
    );
}

#[tokio::test]
async fn resolve_glob_no_match_is_empty() {
    let dir = TempDir::new().unwrap();
    let pattern = format!("{}/qemu_*.core", dir.path().display());
    assert!(target().resolve_glob(&pattern).await.unwrap().is_empty());
}

#[tokio::test]
async fn resolve_glob_rejects_bad_pattern() {
    let result = target().resolve_glob("/tmp/[").await;
    assert!(matches!(result, Err(TargetError::Glob { .. })));
}

#[tokio::test]
async fn retrieve_contents_and_missing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trace.log");
    std::fs::write(&path, b"start_code 0x400000\n").unwrap();

    let contents = target().retrieve_contents(&path.display().to_string()).await.unwrap();
    assert_eq!(contents, b"start_code 0x400000\n");

    let missing = dir.path().join("nope").display().to_string();
    assert!(matches!(
        target().retrieve_contents(&missing).await,
        Err(TargetError::NotFound(p)) if p == missing
    ));
}

#[tokio::test]
async fn retrieve_into_keeps_file_name() {
    let remote = TempDir::new().unwrap();
    let local = TempDir::new().unwrap();
    let path = remote.path().join("qemu_7.core");
    std::fs::write(&path, b"core").unwrap();

    target().retrieve_into(&path.display().to_string(), local.path()).await.unwrap();
    assert_eq!(std::fs::read(local.path().join("qemu_7.core")).unwrap(), b"core");
}

#[tokio::test]
async fn make_and_remove_dir() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("tracer_x").display().to_string();
    let t = target();

    t.make_dir(&dir).await.unwrap();
    std::fs::write(format!("{}/trace.log", dir), b"x").unwrap();
    t.remove_dir(&dir).await.unwrap();
    assert!(!std::path::Path::new(&dir).exists());

    // Removing again is fine
    t.remove_dir(&dir).await.unwrap();
}
