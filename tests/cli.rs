use std::fs::write;
use std::sync::{Arc, Mutex};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, NamedTempFile};
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Layer, Registry};

use filestore_sync::cli::{run, Cli, Commands, UploadArgs};

fn command() -> Command {
    let mut cmd = Command::cargo_bin("filestore-sync").expect("Binary exists");
    cmd.env_remove("FILESTORE_USER")
        .env_remove("FILESTORE_PASSWORD")
        .env("RUST_LOG", "error");
    cmd
}

/// Creates a config naming a target that nothing listens on; tests using it
/// must stop before the first remote call.
fn create_config(base_dir: &std::path::Path) -> NamedTempFile {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    let yaml = format!(
        "connection:\n  server: http://127.0.0.1:9\ntarget:\n  package: $TMP\n  container: ZAPP\n  container_description: Test app\nsource:\n  base_dir: {}\n",
        base_dir.display()
    );
    write(config.path(), yaml).expect("Writing temp config failed");
    config
}

#[test]
fn help_lists_the_upload_options() {
    command()
        .args(["upload", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--container")
                .and(predicate::str::contains("--preserve-unselected"))
                .and(predicate::str::contains("--git-diff-commit"))
                .and(predicate::str::contains("--dry-run")),
        );
}

#[test]
fn version_flag_prints_the_version() {
    command()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn invalid_configuration_exits_with_one_and_lists_every_problem() {
    command()
        .args(["upload", "--package", "ZPKG", "--container", "ABCDEFGHIJKLMNOPQ"])
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("Define both a username and password")
                .and(predicate::str::contains("You should supply a transport."))
                .and(predicate::str::contains("must not be longer than 15 characters")),
        );
}

#[test]
fn empty_selection_stops_before_contacting_the_server() {
    let base = tempdir().unwrap();
    let config = create_config(base.path());

    command()
        .arg("upload")
        .arg("--config")
        .arg(config.path())
        .env("FILESTORE_USER", "DEVELOPER")
        .env("FILESTORE_PASSWORD", "secret")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No files found"));
}

#[test]
fn rejects_a_non_boolean_strict_ssl_value() {
    command()
        .args(["upload", "--strict-ssl", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--strict-ssl"));
}

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn invalid_configuration_is_traced() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    let cli = Cli {
        command: Commands::Upload(UploadArgs {
            user: Some("u".to_string()),
            password: Some("p".to_string()),
            ..Default::default()
        }),
    };

    let result = run(cli).await;

    assert!(result.is_err());
    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("Invalid configuration")),
        "Expected an 'Invalid configuration' trace event, got: {:?}",
        event_msgs
    );
}
