//! End-to-end detection with the built-in detector order

mod common;

use ambient_id::{vars, AmbientDetector, CommandOutput, FixedEnvironment, Provider};
use common::RecordingRunner;

fn detector(env: FixedEnvironment, runner: &RecordingRunner) -> AmbientDetector {
    AmbientDetector::new()
        .environment(env)
        .command_runner(runner.clone())
}

#[tokio::test]
async fn test_detect_credential_none() {
    let runner = RecordingRunner::returning(CommandOutput::success("fakejwt"));
    let result = detector(FixedEnvironment::new(), &runner)
        .detect("some-audience")
        .await
        .unwrap();

    assert!(result.is_none());
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_earlier_provider_wins() {
    let runner = RecordingRunner::returning(CommandOutput::success("buildkite-jwt"));
    let env = FixedEnvironment::new()
        .with_var(vars::BUILDKITE, "true")
        .with_executable("buildkite-agent", "/usr/bin/buildkite-agent")
        .with_var(vars::GITLAB_CI, "true")
        .with_var("SOME_AUDIENCE_ID_TOKEN", "gitlab-jwt");

    let credential = detector(env, &runner)
        .detect("some-audience")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(credential.provider(), Provider::Buildkite);
    assert_eq!(credential.as_str(), "buildkite-jwt");
    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test]
async fn test_failure_does_not_fall_through() {
    let runner = RecordingRunner::returning(CommandOutput::success("buildkite-jwt"));
    let env = FixedEnvironment::new()
        .with_var(vars::GITHUB_ACTIONS, "true")
        .with_var(vars::BUILDKITE, "true")
        .with_executable("buildkite-agent", "/usr/bin/buildkite-agent");

    let err = detector(env, &runner)
        .detect("some-audience")
        .await
        .unwrap_err();

    assert!(err.is_permission_error());
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_later_provider_after_absent_ones() {
    let runner = RecordingRunner::returning(CommandOutput::success("circleci-jwt"));
    let env = FixedEnvironment::new()
        .with_var(vars::CIRCLECI, "true")
        .with_executable("circleci", "/usr/bin/circleci")
        .with_file("/sys/class/dmi/id/product_name", "Standard PC");

    let credential = detector(env, &runner)
        .detect("some-audience")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(credential.provider(), Provider::CircleCi);
    assert_eq!(credential.into_inner(), "circleci-jwt");
}
