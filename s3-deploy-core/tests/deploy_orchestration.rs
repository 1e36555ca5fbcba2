use mockall::Sequence;
use s3_deploy_core::command::CommandSpec;
use s3_deploy_core::contract::{MockCommandRunner, MockInputSource, MockPathProbe, MockReporter};
use s3_deploy_core::deploy::{deploy, failure_message, DeployReport};
use s3_deploy_core::error::{ConfigurationError, DeployError, ExecError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const INVALIDATION_RESPONSE: &str = r#"{"Invalidation":{"Id":"INVALIDATION123"}}"#;

/// Everything the run reported, in call order per channel.
#[derive(Debug, Default)]
struct Reported {
    infos: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    masks: Vec<String>,
    outputs: Vec<(String, String)>,
    failures: Vec<String>,
}

fn recording_reporter() -> (MockReporter, Arc<Mutex<Reported>>) {
    let reported = Arc::new(Mutex::new(Reported::default()));
    let mut reporter = MockReporter::new();

    let r = reported.clone();
    reporter
        .expect_info()
        .returning(move |m| r.lock().unwrap().infos.push(m.to_string()));
    let r = reported.clone();
    reporter
        .expect_warning()
        .returning(move |m| r.lock().unwrap().warnings.push(m.to_string()));
    let r = reported.clone();
    reporter
        .expect_error()
        .returning(move |m| r.lock().unwrap().errors.push(m.to_string()));
    let r = reported.clone();
    reporter
        .expect_mask()
        .returning(move |m| r.lock().unwrap().masks.push(m.to_string()));
    let r = reported.clone();
    reporter.expect_set_output().returning(move |name, value| {
        r.lock()
            .unwrap()
            .outputs
            .push((name.to_string(), value.to_string()))
    });
    let r = reported.clone();
    reporter
        .expect_set_failed()
        .returning(move |m| r.lock().unwrap().failures.push(m.to_string()));

    (reporter, reported)
}

fn default_inputs() -> HashMap<String, String> {
    [
        ("AWS_ACCESS_KEY_ID", "test-access-key"),
        ("AWS_SECRET_ACCESS_KEY", "test-secret-key"),
        ("AWS_S3_BUCKET", "test-bucket"),
        ("SOURCE_DIR", "test-source-dir"),
        ("AWS_REGION", "us-east-1"),
        ("CLOUDFRONT_DISTRIBUTION_ID", "test-distribution-id"),
        ("AWS_S3_PREFIX", "test-prefix"),
        ("AWS_S3_ENDPOINT", "test-endpoint"),
        ("AWS_S3_ACL", "public-read"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn inputs_with(overrides: &[(&str, &str)]) -> MockInputSource {
    let mut map = default_inputs();
    for (k, v) in overrides {
        map.insert(k.to_string(), v.to_string());
    }
    let mut inputs = MockInputSource::new();
    inputs
        .expect_get_input()
        .returning(move |name| map.get(name).cloned());
    inputs
}

fn existing_source_dir() -> MockPathProbe {
    let mut probe = MockPathProbe::new();
    probe.expect_exists().return_const(true);
    probe
}

fn is_sync(command: &CommandSpec) -> bool {
    command.args.starts_with(&["s3".to_string(), "sync".to_string()])
}

fn is_invalidation(command: &CommandSpec) -> bool {
    command
        .args
        .starts_with(&["cloudfront".to_string(), "create-invalidation".to_string()])
}

fn exit_failure(command: &CommandSpec) -> ExecError {
    ExecError::Exit {
        command: command.to_string(),
        status: "exit status: 1".to_string(),
        stderr: None,
    }
}

#[tokio::test]
async fn test_end_to_end_sync_then_invalidate() {
    let inputs = inputs_with(&[]);
    let probe = existing_source_dir();
    let (reporter, reported) = recording_reporter();

    let mut seq = Sequence::new();
    let mut runner = MockCommandRunner::new();
    runner
        .expect_run_streaming()
        .withf(|command| {
            command.to_string()
                == r#"aws s3 sync "test-source-dir" "s3://test-bucket/test-prefix" --no-progress --acl "public-read" --endpoint-url "test-endpoint""#
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    runner
        .expect_run_captured()
        .withf(|command| {
            command.to_string()
                == r#"aws cloudfront create-invalidation --distribution-id "test-distribution-id" --paths "/*" --output "json""#
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(INVALIDATION_RESPONSE.to_string()));

    let report = deploy(&inputs, &probe, &runner, &reporter)
        .await
        .expect("deployment should succeed");

    assert_eq!(
        report,
        DeployReport {
            s3_url: "s3://test-bucket/test-prefix".to_string(),
            invalidation_id: Some("INVALIDATION123".to_string()),
        }
    );

    let reported = reported.lock().unwrap();
    assert_eq!(
        reported.outputs,
        vec![
            ("s3_url".to_string(), "s3://test-bucket/test-prefix".to_string()),
            (
                "cloudfront_invalidation_id".to_string(),
                "INVALIDATION123".to_string()
            ),
        ]
    );
    assert!(reported.failures.is_empty());
    assert!(reported.errors.is_empty());
    assert!(reported
        .infos
        .contains(&"Syncing files from test-source-dir to S3 bucket: s3://test-bucket/test-prefix".to_string()));
    assert!(reported.infos.contains(&"Using endpoint: test-endpoint".to_string()));
    assert!(reported
        .infos
        .contains(&"Invalidating CloudFront distribution: test-distribution-id".to_string()));
    assert!(reported
        .infos
        .contains(&"CloudFront cache invalidation completed.".to_string()));
}

#[tokio::test]
async fn test_credentials_are_masked_and_passed_to_commands() {
    let inputs = inputs_with(&[]);
    let probe = existing_source_dir();
    let (reporter, reported) = recording_reporter();

    let mut runner = MockCommandRunner::new();
    runner
        .expect_run_streaming()
        .withf(|command| {
            command.env("AWS_ACCESS_KEY_ID") == Some("test-access-key")
                && command.env("AWS_SECRET_ACCESS_KEY") == Some("test-secret-key")
                && command.env("AWS_DEFAULT_REGION") == Some("us-east-1")
                && command.env("AWS_S3_ENDPOINT") == Some("test-endpoint")
        })
        .times(1)
        .returning(|_| Ok(()));
    runner
        .expect_run_captured()
        .withf(|command| command.env("AWS_ACCESS_KEY_ID") == Some("test-access-key"))
        .times(1)
        .returning(|_| Ok(INVALIDATION_RESPONSE.to_string()));

    deploy(&inputs, &probe, &runner, &reporter).await.unwrap();

    let reported = reported.lock().unwrap();
    assert_eq!(reported.masks, vec!["test-access-key", "test-secret-key"]);
}

#[tokio::test]
async fn test_empty_endpoint_is_not_logged_or_exported() {
    let inputs = inputs_with(&[("AWS_S3_ENDPOINT", "")]);
    let probe = existing_source_dir();
    let (reporter, reported) = recording_reporter();

    let mut runner = MockCommandRunner::new();
    runner
        .expect_run_streaming()
        .withf(|command| {
            command.env("AWS_S3_ENDPOINT").is_none()
                && command.to_string()
                    == r#"aws s3 sync "test-source-dir" "s3://test-bucket/test-prefix" --no-progress --acl "public-read""#
        })
        .times(1)
        .returning(|_| Ok(()));
    runner
        .expect_run_captured()
        .withf(|command| command.env("AWS_S3_ENDPOINT").is_none())
        .times(1)
        .returning(|_| Ok(INVALIDATION_RESPONSE.to_string()));

    deploy(&inputs, &probe, &runner, &reporter).await.unwrap();

    let reported = reported.lock().unwrap();
    assert!(reported
        .infos
        .iter()
        .all(|m| !m.contains("Using endpoint:")));
}

#[tokio::test]
async fn test_no_distribution_skips_invalidation() {
    let inputs = inputs_with(&[("CLOUDFRONT_DISTRIBUTION_ID", "")]);
    let probe = existing_source_dir();
    let (reporter, reported) = recording_reporter();

    let mut runner = MockCommandRunner::new();
    runner
        .expect_run_streaming()
        .withf(is_sync)
        .times(1)
        .returning(|_| Ok(()));
    runner.expect_run_captured().never();

    let report = deploy(&inputs, &probe, &runner, &reporter).await.unwrap();
    assert_eq!(report.invalidation_id, None);

    let reported = reported.lock().unwrap();
    assert_eq!(
        reported.outputs,
        vec![("s3_url".to_string(), "s3://test-bucket/test-prefix".to_string())]
    );
    assert!(reported.failures.is_empty());
}

#[tokio::test]
async fn test_response_without_id_sets_no_invalidation_output() {
    let inputs = inputs_with(&[("AWS_S3_PREFIX", "")]);
    let probe = existing_source_dir();
    let (reporter, reported) = recording_reporter();

    let mut runner = MockCommandRunner::new();
    runner.expect_run_streaming().returning(|_| Ok(()));
    runner
        .expect_run_captured()
        .withf(is_invalidation)
        .times(1)
        .returning(|_| Ok(r#"{"Invalidation":{"Status":"InProgress"}}"#.to_string()));

    let report = deploy(&inputs, &probe, &runner, &reporter).await.unwrap();
    assert_eq!(report.s3_url, "s3://test-bucket");
    assert_eq!(report.invalidation_id, None);

    let reported = reported.lock().unwrap();
    assert_eq!(
        reported.outputs,
        vec![("s3_url".to_string(), "s3://test-bucket".to_string())]
    );
    assert_eq!(reported.warnings.len(), 1);
    assert!(reported.failures.is_empty());
}

#[tokio::test]
async fn test_missing_source_dir_fails_before_any_command() {
    let inputs = inputs_with(&[("SOURCE_DIR", "nonexistent-dir")]);
    let mut probe = MockPathProbe::new();
    probe.expect_exists().return_const(false);
    let (reporter, reported) = recording_reporter();

    let mut runner = MockCommandRunner::new();
    runner.expect_run_streaming().never();
    runner.expect_run_captured().never();

    let err = deploy(&inputs, &probe, &runner, &reporter)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DeployError::Configuration(ConfigurationError::SourceDirMissing { .. })
    ));

    let reported = reported.lock().unwrap();
    assert_eq!(
        reported.failures,
        vec!["Action failed with error: Source directory does not exist: nonexistent-dir"]
    );
    assert!(reported.outputs.is_empty());
    assert!(reported.masks.is_empty());
}

#[tokio::test]
async fn test_missing_required_input_fails_the_run() {
    let inputs = inputs_with(&[("AWS_ACCESS_KEY_ID", "")]);
    let probe = existing_source_dir();
    let (reporter, reported) = recording_reporter();

    let mut runner = MockCommandRunner::new();
    runner.expect_run_streaming().never();
    runner.expect_run_captured().never();

    deploy(&inputs, &probe, &runner, &reporter)
        .await
        .unwrap_err();

    let reported = reported.lock().unwrap();
    assert_eq!(
        reported.failures,
        vec!["Action failed with error: Input required and not supplied: AWS_ACCESS_KEY_ID"]
    );
}

#[tokio::test]
async fn test_sync_failure_skips_invalidation() {
    let inputs = inputs_with(&[]);
    let probe = existing_source_dir();
    let (reporter, reported) = recording_reporter();

    let mut runner = MockCommandRunner::new();
    runner
        .expect_run_streaming()
        .times(1)
        .returning(|command| Err(exit_failure(command)));
    runner.expect_run_captured().never();

    let err = deploy(&inputs, &probe, &runner, &reporter)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::Sync(ExecError::Exit { .. })));

    let reported = reported.lock().unwrap();
    assert_eq!(reported.errors, vec!["Error syncing files to S3"]);
    assert_eq!(reported.failures.len(), 1);
    assert_eq!(
        reported.failures[0],
        failure_message(&err)
    );
    assert!(reported.outputs.is_empty());
}

#[tokio::test]
async fn test_sync_launch_failure_is_a_sync_error() {
    let inputs = inputs_with(&[("CLOUDFRONT_DISTRIBUTION_ID", "")]);
    let probe = existing_source_dir();
    let (reporter, reported) = recording_reporter();

    let mut runner = MockCommandRunner::new();
    runner.expect_run_streaming().returning(|command| {
        Err(ExecError::Launch {
            program: command.program.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
        })
    });

    let err = deploy(&inputs, &probe, &runner, &reporter)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::Sync(ExecError::Launch { .. })));
    assert!(reported.lock().unwrap().failures[0].contains("failed to launch `aws`"));
}

#[tokio::test]
async fn test_invalidation_failure_fails_the_run_after_successful_sync() {
    let inputs = inputs_with(&[]);
    let probe = existing_source_dir();
    let (reporter, reported) = recording_reporter();

    let mut seq = Sequence::new();
    let mut runner = MockCommandRunner::new();
    runner
        .expect_run_streaming()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    runner
        .expect_run_captured()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|command| {
            Err(ExecError::Exit {
                command: command.to_string(),
                status: "exit status: 254".to_string(),
                stderr: Some("An error occurred (AccessDenied)".to_string()),
            })
        });

    let err = deploy(&inputs, &probe, &runner, &reporter)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::Invalidation(_)));
    assert!(err.to_string().ends_with(": An error occurred (AccessDenied)"));

    let reported = reported.lock().unwrap();
    assert_eq!(reported.errors, vec!["Error invalidating CloudFront cache"]);
    assert_eq!(
        reported.failures,
        vec![failure_message(&err)]
    );
    assert!(reported.outputs.is_empty());
    assert!(reported
        .infos
        .iter()
        .all(|m| m != "CloudFront cache invalidation completed."));
}

#[tokio::test]
async fn test_delete_removed_adds_delete_clause() {
    let inputs = inputs_with(&[("DELETE_REMOVED", "true"), ("CLOUDFRONT_DISTRIBUTION_ID", "")]);
    let probe = existing_source_dir();
    let (reporter, _reported) = recording_reporter();

    let mut runner = MockCommandRunner::new();
    runner
        .expect_run_streaming()
        .withf(|command| command.args.last().map(String::as_str) == Some("--delete"))
        .times(1)
        .returning(|_| Ok(()));

    deploy(&inputs, &probe, &runner, &reporter).await.unwrap();
}

#[tokio::test]
async fn test_default_source_dir_is_current_directory() {
    let inputs = inputs_with(&[("SOURCE_DIR", ""), ("CLOUDFRONT_DISTRIBUTION_ID", "")]);
    let probe = existing_source_dir();
    let (reporter, _reported) = recording_reporter();

    let mut runner = MockCommandRunner::new();
    runner
        .expect_run_streaming()
        .withf(|command| command.to_string().starts_with(r#"aws s3 sync "." "s3://"#))
        .times(1)
        .returning(|_| Ok(()));

    deploy(&inputs, &probe, &runner, &reporter).await.unwrap();
}
