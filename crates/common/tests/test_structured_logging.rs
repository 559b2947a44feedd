use common::{init_structured_logging, ExecutionContext, LoggingConfig, OperationTimer};
use std::time::Duration;

#[test]
fn test_subscriber_installs_once() {
    let config = LoggingConfig {
        json_output: true,
        include_context: false,
        ..LoggingConfig::default().with_verbosity(1)
    };

    assert!(init_structured_logging(config.clone()).is_ok());
    // a second global subscriber is refused
    assert!(init_structured_logging(config).is_err());

    let mut timer = OperationTimer::new("generate");
    timer.add_field("file", "Repo.java");
    timer.add_field("nodes", 3);
    timer.finish_with_result(Err::<(), _>("template failed"));
}

#[test]
fn test_timer_measures_elapsed_time() {
    let timer = OperationTimer::new("remove");
    std::thread::sleep(Duration::from_millis(15));
    assert!(timer.elapsed_ms() >= 15);
    timer.finish();
}

#[test]
fn test_execution_context_describes_process() {
    let context = ExecutionContext::default();
    assert_eq!(context.pid, std::process::id());
    assert_eq!(context.app_version, env!("CARGO_PKG_VERSION"));
    assert!(!context.hostname.is_empty());
}
