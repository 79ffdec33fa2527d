// setkit-core/tests/installer.rs
// Drives the Installer end to end against a fake platform and a local HTTP server.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use setkit_common::context::{DOWNLOADED_FILE_PATH, INSTALL_DIR};
use setkit_common::error::Result;
use setkit_common::{
    ActionKind, Application, CancelToken, Catalog, Config, InstallAction, InstallEvent,
    MatchMode, Phase, Utility,
};
use setkit_core::{CleanupMode, Installer, Platform, Selection};
use setkit_net::Downloader;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

#[derive(Default)]
struct FakePlatform {
    elevated: bool,
    install_dir: Option<PathBuf>,
    desktop: Option<PathBuf>,
    lookups: Mutex<Vec<(String, MatchMode)>>,
    terminated: Mutex<Vec<String>>,
}

impl Platform for FakePlatform {
    fn is_elevated(&self) -> bool {
        self.elevated
    }

    fn is_64bit(&self) -> bool {
        true
    }

    fn install_location(&self, display_name: &str, mode: MatchMode) -> Option<PathBuf> {
        self.lookups
            .lock()
            .unwrap()
            .push((display_name.to_string(), mode));
        self.install_dir.clone()
    }

    fn terminate_processes(&self, name: &str) -> Result<usize> {
        self.terminated.lock().unwrap().push(name.to_string());
        Ok(0)
    }

    fn desktop_dir(&self) -> Option<PathBuf> {
        self.desktop.clone()
    }
}

struct Harness {
    _tmp: tempfile::TempDir,
    config: Config,
    platform: Arc<FakePlatform>,
    events: broadcast::Receiver<InstallEvent>,
    installer: Installer,
}

impl Harness {
    fn new(platform: FakePlatform) -> Self {
        Self::with_cancel(platform, CancelToken::new())
    }

    fn with_cancel(platform: FakePlatform, cancel: CancelToken) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::rooted_at(tmp.path());
        std::fs::create_dir_all(config.temp_dir()).unwrap();
        let platform = Arc::new(platform);
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let downloader = Downloader::with_client(client, config.temp_dir().to_path_buf());
        let (tx, rx) = broadcast::channel(256);
        let installer = Installer::with_downloader(&config, platform.clone(), downloader)
            .with_events(tx)
            .with_cancel(cancel);
        Self {
            _tmp: tmp,
            config,
            platform,
            events: rx,
            installer,
        }
    }

    fn temp(&self) -> &Path {
        self.config.temp_dir()
    }

    fn drain_events(&mut self) -> Vec<InstallEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

fn run_command(command: &str) -> InstallAction {
    InstallAction::new(ActionKind::RunCommand {
        command: Some(command.to_string()),
    })
}

fn utility(name: &str, actions: Vec<InstallAction>) -> Utility {
    Utility {
        name: name.to_string(),
        description: None,
        actions,
    }
}

fn application(yaml: &str) -> Application {
    let catalog = Catalog::from_yaml(yaml).unwrap();
    catalog.applications.into_iter().next().unwrap()
}

/// Serves `body` once for any request on a random local port.
async fn serve_once(body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 4096];
        let mut seen = Vec::new();
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            seen.extend_from_slice(&buf[..n]);
            if n == 0 || seen.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(body).await.unwrap();
        socket.shutdown().await.ok();
    });
    format!("http://{addr}")
}

const INSTALLER_SCRIPT: &[u8] = b"#!/bin/sh\nprintf '%s\\n' \"$*\" > \"$(dirname \"$0\")/invoked.txt\"\n";

#[cfg(unix)]
#[tokio::test]
async fn download_and_run_fetches_installer_and_passes_args() {
    let base = serve_once(INSTALLER_SCRIPT).await;
    let mut h = Harness::new(FakePlatform::default());
    let app = application(&format!(
        r#"
applications:
  - name: Tool
    processName: tool.exe
    version: "1.2"
    downloadLinks:
      - name: Official
        targets:
          - url_x64: {base}/setup.sh
            url_x86: {base}/setup32.sh
    installSteps:
      - Type: DownloadAndRun
        args: --silent /S
"#
    ));

    let report = h.installer.process_application(&app, CleanupMode::None).await;

    let installer = h.temp().join("setup.sh");
    assert!(installer.is_file());
    let invoked = std::fs::read_to_string(h.temp().join("invoked.txt")).unwrap();
    assert_eq!(invoked.trim(), "--silent /S");

    let install = report.phase(Phase::Install).unwrap();
    assert_eq!((install.attempted, install.completed, install.failed), (1, 1, 0));
    assert_eq!(
        report.context.get(DOWNLOADED_FILE_PATH),
        Some(&*installer.to_string_lossy())
    );
    assert_eq!(*h.platform.terminated.lock().unwrap(), vec!["tool.exe".to_string()]);
    assert!(h
        .drain_events()
        .iter()
        .any(|e| matches!(e, InstallEvent::ActionCompleted { kind, .. } if kind == "DownloadAndRun")));
}

#[cfg(unix)]
#[tokio::test]
async fn tracked_cleanup_removes_only_downloaded_files() {
    let base = serve_once(b"payload").await;
    let h = Harness::new(FakePlatform::default());
    let unrelated = h.temp().join("other-app.zip");
    std::fs::write(&unrelated, b"keep me").unwrap();
    let tool = utility(
        "Fetch",
        vec![InstallAction::new(ActionKind::Download {
            url: Some(format!("{base}/bundle.zip")),
            file_name: None,
        })],
    );

    let report = h.installer.process_utility(&tool, CleanupMode::Tracked).await;

    assert_eq!(report.totals().completed, 1);
    assert!(!h.temp().join("bundle.zip").exists());
    assert!(unrelated.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn utility_run_command_leaves_context_untouched() {
    let mut h = Harness::new(FakePlatform::default());
    let tool = utility("Hello", vec![run_command("echo hello")]);

    let report = h.installer.process_utility(&tool, CleanupMode::None).await;

    let actions = report.phase(Phase::Actions).unwrap();
    assert_eq!((actions.attempted, actions.completed, actions.skipped), (1, 1, 0));
    assert!(report.context.is_empty());
    assert!(h.platform.terminated.lock().unwrap().is_empty());
    assert!(h.platform.lookups.lock().unwrap().is_empty());
    assert!(!h
        .drain_events()
        .iter()
        .any(|e| matches!(e, InstallEvent::ActionSkipped { .. })));
}

#[tokio::test]
async fn extract_with_missing_archive_fails_inside_the_list() {
    let mut h = Harness::new(FakePlatform::default());
    let missing = h.temp().join("nope.7z");
    let tool = utility(
        "Unpack",
        vec![InstallAction::new(ActionKind::Extract {
            archive: Some(missing.to_string_lossy().into_owned()),
            destination: Some(h.temp().join("out").to_string_lossy().into_owned()),
            args: None,
        })],
    );

    let report = h.installer.process_utility(&tool, CleanupMode::None).await;

    assert_eq!(report.totals().attempted, 1);
    assert_eq!(report.totals().failed, 1);
    assert!(h
        .drain_events()
        .iter()
        .any(|e| matches!(e, InstallEvent::ActionFailed { kind, .. } if kind == "Extract")));
}

#[cfg(unix)]
#[tokio::test]
async fn admin_action_is_skipped_once_without_side_effects() {
    let mut h = Harness::new(FakePlatform::default());
    let marker = h.temp().join("admin-marker");
    let tool = utility(
        "Privileged",
        vec![InstallAction::admin(ActionKind::RunCommand {
            command: Some(format!("touch {}", marker.display())),
        })],
    );

    let report = h.installer.process_utility(&tool, CleanupMode::None).await;

    assert!(!marker.exists());
    assert_eq!(report.totals().skipped, 1);
    let skips = h
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, InstallEvent::ActionSkipped { .. }))
        .count();
    assert_eq!(skips, 1);
}

#[cfg(unix)]
#[tokio::test]
async fn admin_action_runs_when_elevated() {
    let h = Harness::new(FakePlatform {
        elevated: true,
        ..Default::default()
    });
    let marker = h.temp().join("admin-marker");
    let tool = utility(
        "Privileged",
        vec![InstallAction::admin(ActionKind::RunCommand {
            command: Some(format!("touch {}", marker.display())),
        })],
    );

    h.installer.process_utility(&tool, CleanupMode::None).await;
    assert!(marker.exists());
}

#[cfg(all(unix, not(target_os = "macos")))]
#[tokio::test]
async fn run_script_waits_and_reads_numeric_args_as_text() {
    use std::os::unix::fs::PermissionsExt;

    let h = Harness::new(FakePlatform::default());
    let script = h.temp().join("configure.sh");
    let marker = h.temp().join("configured.txt");
    std::fs::write(
        &script,
        format!("#!/bin/sh\nsleep 1\nprintf '%s' \"$1\" > '{}'\n", marker.display()),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    let catalog = Catalog::from_yaml(&format!(
        r#"
utilities:
  - name: Configure
    actions:
      - Type: RunScript
        path: {}
        args: 1
"#,
        script.display()
    ))
    .unwrap();

    let report = h
        .installer
        .process_utility(&catalog.utilities[0], CleanupMode::None)
        .await;

    assert_eq!(report.totals().completed, 1);
    assert_eq!(std::fs::read_to_string(&marker).unwrap(), "1");
}

#[tokio::test]
async fn open_file_without_path_is_skipped() {
    let mut h = Harness::new(FakePlatform::default());
    let tool = utility(
        "Viewer",
        vec![
            InstallAction::new(ActionKind::OpenFile { path: None }),
            InstallAction::new(ActionKind::OpenFile {
                path: Some("   ".to_string()),
            }),
        ],
    );

    let report = h.installer.process_utility(&tool, CleanupMode::None).await;

    let totals = report.totals();
    assert_eq!((totals.attempted, totals.skipped, totals.failed), (2, 2, 0));
    let events = h.drain_events();
    assert!(events.iter().all(|e| e.owner() == "Viewer"));
    let skips: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, InstallEvent::ActionSkipped { kind, .. } if kind == "OpenFile"))
        .collect();
    assert_eq!(skips.len(), 2);
}

#[cfg(unix)]
#[tokio::test]
async fn failing_actions_do_not_stop_the_list() {
    let h = Harness::new(FakePlatform::default());
    let marker = h.temp().join("still-ran");
    let tool = utility(
        "Mixed",
        vec![
            run_command("setkit-definitely-missing-binary --flag"),
            InstallAction::new(ActionKind::Download {
                url: Some("ftp://example.invalid/file.bin".to_string()),
                file_name: None,
            }),
            InstallAction::new(ActionKind::Unknown {
                type_name: "InstallDriver".to_string(),
            }),
            run_command(&format!("touch {}", marker.display())),
        ],
    );

    let report = h.installer.process_utility(&tool, CleanupMode::None).await;

    let totals = report.totals();
    assert_eq!(totals.attempted, 4);
    assert_eq!(totals.failed, 2);
    assert_eq!(totals.skipped, 1);
    assert_eq!(totals.completed, 1);
    assert!(marker.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn install_dir_is_published_between_install_and_patch() {
    let install_root = tempfile::tempdir().unwrap();
    let mut h = Harness::new(FakePlatform {
        install_dir: Some(install_root.path().to_path_buf()),
        ..Default::default()
    });
    let app = application(
        r#"
applications:
  - name: Tool
    registryDisplayName: Tool 1.0
    installSteps:
      - Type: RunCommand
        command: "true"
    patch:
      - Type: RunCommand
        command: touch {install_dir}/patched
"#,
    );

    let report = h.installer.process_application(&app, CleanupMode::None).await;

    assert!(install_root.path().join("patched").exists());
    assert_eq!(report.install_dir.as_deref(), Some(install_root.path()));
    assert!(report.context.contains(INSTALL_DIR));
    assert_eq!(
        *h.platform.lookups.lock().unwrap(),
        vec![("Tool 1.0".to_string(), MatchMode::Exact)]
    );

    let events = h.drain_events();
    let detected = events
        .iter()
        .position(|e| matches!(e, InstallEvent::InstallDirDetected { .. }))
        .unwrap();
    let install_done = events
        .iter()
        .rposition(|e| matches!(e, InstallEvent::ActionCompleted { phase: Phase::Install, .. }))
        .unwrap();
    let patch_started = events
        .iter()
        .position(|e| matches!(e, InstallEvent::PhaseStarted { phase: Phase::Patch, .. }))
        .unwrap();
    assert!(install_done < detected && detected < patch_started);
}

#[tokio::test]
async fn missing_install_dir_is_a_warning_not_a_failure() {
    let mut h = Harness::new(FakePlatform::default());
    let app = application(
        r#"
applications:
  - name: Tool
    registryDisplayName: Tool
    version: "3.1"
"#,
    );

    let report = h.installer.process_application(&app, CleanupMode::None).await;

    assert!(report.install_dir.is_none());
    assert!(!report.context.contains(INSTALL_DIR));
    assert_eq!(report.context.get("{version}"), Some("3.1"));
    assert_eq!(report.phases.len(), 3);
    assert!(h
        .drain_events()
        .iter()
        .any(|e| matches!(e, InstallEvent::InstallDirMissing { .. })));
}

#[tokio::test]
async fn download_and_run_outside_an_application_is_skipped() {
    let h = Harness::new(FakePlatform::default());
    let tool = utility(
        "Misplaced",
        vec![InstallAction::new(ActionKind::DownloadAndRun { args: None })],
    );
    let report = h.installer.process_utility(&tool, CleanupMode::None).await;
    assert_eq!(report.totals().skipped, 1);
    assert_eq!(report.totals().failed, 0);
}

#[cfg(unix)]
#[tokio::test]
async fn shortcut_is_created_on_the_platform_desktop() {
    let desktop = tempfile::tempdir().unwrap();
    let h = Harness::new(FakePlatform {
        desktop: Some(desktop.path().to_path_buf()),
        ..Default::default()
    });
    let tool = utility(
        "Link",
        vec![InstallAction::new(ActionKind::CreateShortcut {
            target: Some("/bin/sh".to_string()),
            shortcut_name: Some("Shell".to_string()),
        })],
    );

    let report = h.installer.process_utility(&tool, CleanupMode::None).await;

    assert_eq!(report.totals().completed, 1);
    assert_eq!(
        std::fs::read_link(desktop.path().join("Shell")).unwrap(),
        Path::new("/bin/sh")
    );
}

#[cfg(unix)]
#[tokio::test]
async fn cancellation_stops_the_running_list_and_remaining_items() {
    let cancel = CancelToken::new();
    let h = Harness::with_cancel(FakePlatform::default(), cancel.clone());
    let marker = h.temp().join("never");
    let slow = utility(
        "Slow",
        vec![run_command("sleep 30"), run_command(&format!("touch {}", marker.display()))],
    );
    let after = utility("After", vec![run_command(&format!("touch {}", marker.display()))]);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });
    let selection = [Selection::Utility(&slow), Selection::Utility(&after)];
    let reports = tokio::time::timeout(
        Duration::from_secs(10),
        h.installer.process_selection(&selection, CleanupMode::None),
    )
    .await
    .unwrap();

    assert_eq!(reports.len(), 1);
    assert!(reports[0].cancelled);
    assert_eq!(reports[0].totals().attempted, 1);
    assert!(!marker.exists());
}
