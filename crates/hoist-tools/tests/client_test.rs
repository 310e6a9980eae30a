use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use hoist_tools::crd::{CrdCheck, CrdQueryError, CrdSource, missing_crds};
use hoist_tools::docker::{DockerClient, DockerError, PushTarget};
use hoist_tools::executor::{ToolError, ToolExecutor};
use hoist_tools::kubectl::{ClusterError, KubectlClient};
use mockall::mock;

mock! {
    Executor {}

    impl ToolExecutor for Executor {
        async fn exec(&self, program: &str, args: &[String]) -> Result<String, ToolError>;
        async fn exec_streaming(&self, program: &str, args: &[String]) -> Result<(), ToolError>;
        async fn exec_interactive(&self, program: &str, args: &[String]) -> Result<(), ToolError>;
    }
}

mock! {
    Crds {}

    impl CrdSource for Crds {
        async fn installed(&self) -> Result<BTreeSet<String>, CrdQueryError>;
    }
}

fn command_failed(stderr: &str) -> ToolError {
    ToolError::CommandFailed {
        program: "kubectl".to_owned(),
        args: vec![],
        stderr: stderr.to_owned(),
    }
}

// ── Namespace Tests ──

#[tokio::test]
async fn ensure_namespace_skips_create_when_present() {
    let mut mock = MockExecutor::new();

    // get succeeds; no create expectation — an unexpected create panics
    mock.expect_exec()
        .withf(|program, args| {
            program == "kubectl"
                && args.contains(&"get".to_owned())
                && args.contains(&"namespace".to_owned())
        })
        .returning(|_, _| Ok("namespace/taco\n".to_owned()));

    let client = KubectlClient::with_executor(mock);
    client.ensure_namespace("taco").await.unwrap();
}

#[tokio::test]
async fn ensure_namespace_creates_when_absent() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| args.contains(&"get".to_owned()))
        .returning(|_, _| Err(command_failed("NotFound")));

    mock.expect_exec()
        .withf(|program, args| {
            program == "kubectl"
                && args.contains(&"create".to_owned())
                && args.contains(&"namespace".to_owned())
                && args.contains(&"taco".to_owned())
        })
        .returning(|_, _| Ok("namespace/taco created\n".to_owned()));

    let client = KubectlClient::with_executor(mock);
    client.ensure_namespace("taco").await.unwrap();
}

#[tokio::test]
async fn ensure_namespace_tolerates_create_race() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| args.contains(&"get".to_owned()))
        .returning(|_, _| Err(command_failed("NotFound")));

    // Another process created the namespace between probe and create.
    mock.expect_exec()
        .withf(|_, args| args.contains(&"create".to_owned()))
        .returning(|_, _| {
            Err(command_failed(
                "Error from server (AlreadyExists): namespaces \"taco\" already exists",
            ))
        });

    let client = KubectlClient::with_executor(mock);
    client.ensure_namespace("taco").await.unwrap();
}

#[tokio::test]
async fn ensure_namespace_surfaces_other_create_failures() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| args.contains(&"get".to_owned()))
        .returning(|_, _| Err(command_failed("NotFound")));

    mock.expect_exec()
        .withf(|_, args| args.contains(&"create".to_owned()))
        .returning(|_, _| Err(command_failed("forbidden")));

    let client = KubectlClient::with_executor(mock);
    let result = client.ensure_namespace("taco").await;

    assert!(matches!(
        result,
        Err(ClusterError::Namespace { ref namespace, .. }) if namespace == "taco"
    ));
}

// ── Apply / Delete Tests ──

#[tokio::test]
async fn apply_targets_rendered_directory_recursively() {
    let mut mock = MockExecutor::new();

    mock.expect_exec_streaming()
        .withf(|program, args| {
            program == "kubectl"
                && args.contains(&"--namespace".to_owned())
                && args.contains(&"taco".to_owned())
                && args.contains(&"apply".to_owned())
                && args.contains(&"-R".to_owned())
                && args.contains(&"k8s".to_owned())
        })
        .returning(|_, _| Ok(()));

    let client = KubectlClient::with_executor(mock);
    client.apply("taco", Path::new("k8s")).await.unwrap();
}

#[tokio::test]
async fn apply_failure_is_fatal() {
    let mut mock = MockExecutor::new();

    mock.expect_exec_streaming()
        .returning(|_, _| Err(command_failed("connection refused")));

    let client = KubectlClient::with_executor(mock);
    let result = client.apply("taco", Path::new("k8s")).await;

    assert!(matches!(result, Err(ClusterError::Apply { .. })));
}

#[tokio::test]
async fn delete_targets_rendered_directory() {
    let mut mock = MockExecutor::new();

    mock.expect_exec_streaming()
        .withf(|_, args| {
            args.contains(&"delete".to_owned())
                && args.contains(&"-R".to_owned())
                && args.contains(&"k8s".to_owned())
        })
        .returning(|_, _| Ok(()));

    let client = KubectlClient::with_executor(mock);
    client.delete("taco", Path::new("k8s")).await.unwrap();
}

// ── Pod Tests ──

#[tokio::test]
async fn latest_pod_takes_last_of_start_time_sorted_list() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| {
            args.contains(&"--sort-by".to_owned())
                && args.contains(&".status.startTime".to_owned())
        })
        .returning(|_, _| Ok("pod/foobar-a1b2\npod/foobar-c3d4\n".to_owned()));

    let client = KubectlClient::with_executor(mock);
    let pod = client.latest_pod("taco").await.unwrap();

    assert_eq!(pod, "foobar-c3d4");
}

#[tokio::test]
async fn latest_pod_empty_namespace_is_an_error() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| args.contains(&"pods".to_owned()))
        .returning(|_, _| Ok("\n".to_owned()));

    let client = KubectlClient::with_executor(mock);
    let result = client.latest_pod("taco").await;

    assert!(matches!(
        result,
        Err(ClusterError::NoPods { ref namespace }) if namespace == "taco"
    ));
}

#[tokio::test]
async fn pod_phase_trims_jsonpath_output() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| args.contains(&"jsonpath={.status.phase}".to_owned()))
        .returning(|_, _| Ok("Running\n".to_owned()));

    let client = KubectlClient::with_executor(mock);
    let phase = client.pod_phase("taco", "foobar-c3d4").await.unwrap();

    assert_eq!(phase, "Running");
}

#[tokio::test(start_paused = true)]
async fn wait_until_running_retries_until_phase_flips() {
    let mut mock = MockExecutor::new();

    let calls = AtomicU32::new(0);
    mock.expect_exec()
        .withf(|_, args| args.contains(&"jsonpath={.status.phase}".to_owned()))
        .times(3)
        .returning(move |_, _| {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Ok("Pending".to_owned())
            } else {
                Ok("Running".to_owned())
            }
        });

    let client = KubectlClient::with_executor(mock);
    client
        .wait_until_running("taco", "foobar-c3d4", 5)
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn wait_until_running_exhausts_retry_budget() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| args.contains(&"jsonpath={.status.phase}".to_owned()))
        .times(5)
        .returning(|_, _| Ok("Pending".to_owned()));

    let client = KubectlClient::with_executor(mock);
    let result = client.wait_until_running("taco", "foobar-c3d4", 5).await;

    assert!(matches!(
        result,
        Err(ClusterError::PodNotRunning { ref pod, attempts: 5 }) if pod == "foobar-c3d4"
    ));
}

#[tokio::test]
async fn attach_opens_interactive_shell() {
    let mut mock = MockExecutor::new();

    mock.expect_exec_interactive()
        .withf(|program, args| {
            program == "kubectl"
                && args.contains(&"exec".to_owned())
                && args.contains(&"-it".to_owned())
                && args.contains(&"foobar-c3d4".to_owned())
                && args.contains(&"/bin/bash".to_owned())
        })
        .returning(|_, _| Ok(()));

    let client = KubectlClient::with_executor(mock);
    client.attach("taco", "foobar-c3d4").await.unwrap();
}

// ── Docker Tests ──

#[tokio::test]
async fn build_streams_docker_build() {
    let mut mock = MockExecutor::new();

    mock.expect_exec_streaming()
        .withf(|program, args| {
            program == "docker"
                && args.contains(&"build".to_owned())
                && args.contains(&"foobar:9f3c2a1b".to_owned())
        })
        .returning(|_, _| Ok(()));

    let client = DockerClient::with_executor(mock);
    client.build("foobar:9f3c2a1b").await.unwrap();
}

#[tokio::test]
async fn tag_invokes_docker_tag() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|program, args| {
            program == "docker"
                && args.contains(&"tag".to_owned())
                && args.contains(&"foobar:1".to_owned())
                && args.contains(&"localhost:5000/foobar:1".to_owned())
        })
        .returning(|_, _| Ok(String::new()));

    let client = DockerClient::with_executor(mock);
    client.tag("foobar:1", "localhost:5000/foobar:1").await.unwrap();
}

#[tokio::test]
async fn push_to_registry_uses_docker() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|program, args| {
            program == "docker"
                && args.contains(&"push".to_owned())
                && args.contains(&"localhost:5000/foobar:1".to_owned())
        })
        .returning(|_, _| Ok(String::new()));

    let client = DockerClient::with_executor(mock);
    client
        .push("localhost:5000/foobar:1", PushTarget::Registry)
        .await
        .unwrap();
}

#[tokio::test]
async fn push_to_gcr_goes_through_gcloud() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|program, args| {
            program == "gcloud"
                && args.contains(&"docker".to_owned())
                && args.contains(&"--".to_owned())
                && args.contains(&"push".to_owned())
                && args.contains(&"gcr.io/proj/foobar:1".to_owned())
        })
        .returning(|_, _| Ok(String::new()));

    let client = DockerClient::with_executor(mock);
    client
        .push("gcr.io/proj/foobar:1", PushTarget::Gcloud)
        .await
        .unwrap();
}

#[tokio::test]
async fn push_failure_carries_captured_stderr() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .returning(|_, _| {
            Err(ToolError::CommandFailed {
                program: "docker".to_owned(),
                args: vec![],
                stderr: "denied: requested access to the resource is denied".to_owned(),
            })
        });

    let client = DockerClient::with_executor(mock);
    let err = client
        .push("localhost:5000/foobar:1", PushTarget::Registry)
        .await
        .unwrap_err();

    assert!(matches!(err, DockerError::Push { .. }));
    assert_eq!(
        err.stderr(),
        Some("denied: requested access to the resource is denied")
    );
}

// ── CRD Check Tests ──

fn required(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| (*s).to_owned()).collect()
}

fn forbidden() -> CrdQueryError {
    CrdQueryError::List {
        source: kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_owned(),
            message: "forbidden".to_owned(),
            reason: "Forbidden".to_owned(),
            code: 403,
        }),
    }
}

#[tokio::test]
async fn crd_check_satisfied_when_all_installed() {
    let mut mock = MockCrds::new();
    mock.expect_installed()
        .returning(|| Ok(required(&["tfjobs.kubeflow.org", "pytorchjobs.kubeflow.org"])));

    let check = missing_crds(&mock, &required(&["tfjobs.kubeflow.org"])).await;

    assert!(matches!(check, CrdCheck::Satisfied));
}

#[tokio::test]
async fn crd_check_reports_set_difference() {
    let mut mock = MockCrds::new();
    mock.expect_installed().returning(|| Ok(required(&["a.example.com"])));

    let check = missing_crds(&mock, &required(&["a.example.com", "b.example.com"])).await;

    match check {
        CrdCheck::Missing(missing) => {
            assert_eq!(missing, required(&["b.example.com"]));
        }
        other => panic!("expected Missing, got {other:?}"),
    }
}

#[tokio::test]
async fn crd_check_empty_requirements_never_queries() {
    // No expect_installed — a query would panic the mock.
    let mock = MockCrds::new();

    let check = missing_crds(&mock, &BTreeSet::new()).await;

    assert!(matches!(check, CrdCheck::Satisfied));
}

#[tokio::test]
async fn crd_check_query_failure_is_not_an_empty_missing_set() {
    let mut mock = MockCrds::new();
    mock.expect_installed().returning(|| Err(forbidden()));

    let check = missing_crds(&mock, &required(&["tfjobs.kubeflow.org"])).await;

    assert!(matches!(check, CrdCheck::QueryFailed(_)));
}
