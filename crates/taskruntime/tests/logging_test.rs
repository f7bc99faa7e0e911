use std::path::PathBuf;
use taskruntime::{Args, Engine, EngineConfig, Flow, Scope, Task};

/// Initialize tracing for tests
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

fn logging_engine(dir: &tempfile::TempDir) -> (Engine, PathBuf) {
    let log_root = dir.path().join("logs");
    let engine = Engine::with_config(EngineConfig {
        cache_root: None,
        log_root: Some(log_root.clone()),
    });
    (engine, log_root)
}

#[tokio::test]
async fn each_task_invocation_logs_to_its_own_sink() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (engine, log_root) = logging_engine(&dir);
    let flow = Flow::new("main");

    flow.run(&engine.root(), |scope| async move {
        Task::new("writer")
            .run(&scope, &Args::new(), |inner: Scope| async move {
                inner.log("hello").await;
                inner.log("world").await;
                Ok::<_, String>(())
            })
            .await
            .unwrap();

        Task::new("second")
            .run(&scope, &Args::new(), |inner: Scope| async move {
                inner.log("elsewhere").await;
                Ok::<_, String>(())
            })
            .await
            .unwrap();
    })
    .await;

    let first = std::fs::read_to_string(log_root.join("call_0.md")).unwrap();
    assert_eq!(first, "hello\nworld\n");
    let second = std::fs::read_to_string(log_root.join("call_1.md")).unwrap();
    assert_eq!(second, "elsewhere\n");
}

#[tokio::test]
async fn retried_attempts_log_to_attempt_suffixed_sinks() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (engine, log_root) = logging_engine(&dir);
    let flow = Flow::new("main");

    flow.run(&engine.root(), |scope| async move {
        Task::new("flaky")
            .retries(2)
            .run(&scope, &Args::new(), |inner: Scope| async move {
                inner.log(format!("attempt {}", inner.attempt())).await;
                if inner.attempt() == 0 {
                    Err("transient".to_string())
                } else {
                    Ok(())
                }
            })
            .await
            .unwrap();
    })
    .await;

    let first = std::fs::read_to_string(log_root.join("call_0.md")).unwrap();
    assert_eq!(first, "attempt 0\n");
    let retry = std::fs::read_to_string(log_root.join("call_0_1.md")).unwrap();
    assert_eq!(retry, "attempt 1\n");
}

#[tokio::test]
async fn nested_flow_logs_into_the_enclosing_tasks_sink() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (engine, log_root) = logging_engine(&dir);
    let flow = Flow::new("main");

    flow.run(&engine.root(), |scope| async move {
        Task::new("outer")
            .run(&scope, &Args::new(), |inner: Scope| async move {
                inner.log("from task").await;
                Flow::new("nested")
                    .run(&inner, |nested| async move {
                        nested.log("from nested flow").await;
                    })
                    .await;
                Ok::<_, String>(())
            })
            .await
            .unwrap();
    })
    .await;

    let text = std::fs::read_to_string(log_root.join("call_0.md")).unwrap();
    assert_eq!(text, "from task\nfrom nested flow\n");
}

#[tokio::test]
async fn nested_task_replaces_the_ancestors_sink() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (engine, log_root) = logging_engine(&dir);
    let flow = Flow::new("main");

    flow.run(&engine.root(), |scope| async move {
        Task::new("outer")
            .run(&scope, &Args::new(), |inner: Scope| async move {
                inner.log("outer line").await;
                Task::new("inner")
                    .run(&inner, &Args::new(), |deep: Scope| async move {
                        deep.log("inner line").await;
                        Ok::<_, String>(())
                    })
                    .await
                    .unwrap();
                Ok::<_, String>(())
            })
            .await
            .unwrap();
    })
    .await;

    let outer = std::fs::read_to_string(log_root.join("call_0.md")).unwrap();
    assert_eq!(outer, "outer line\n");
    let inner = std::fs::read_to_string(log_root.join("call_0_0.md")).unwrap();
    assert_eq!(inner, "inner line\n");
}

#[tokio::test]
async fn logging_outside_any_task_is_a_noop() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (engine, log_root) = logging_engine(&dir);
    let flow = Flow::new("main");

    flow.run(&engine.root(), |scope| async move {
        scope.log("goes nowhere").await;
    })
    .await;

    // No sink was ever bound, so the log root stays untouched.
    assert!(!log_root.exists());
}

#[test]
fn blocking_bodies_log_through_the_same_sink_naming() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (engine, log_root) = logging_engine(&dir);
    let flow = Flow::new("main");

    flow.run_blocking(&engine.root(), |scope| {
        Task::new("writer")
            .run_blocking(&scope, &Args::new(), |inner| {
                inner.log_blocking("sync line");
                Ok::<_, String>(())
            })
            .unwrap();
    });

    let text = std::fs::read_to_string(log_root.join("call_0.md")).unwrap();
    assert_eq!(text, "sync line\n");
}
