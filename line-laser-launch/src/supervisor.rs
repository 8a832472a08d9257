use crate::config::LaunchSettings;
use crate::error::LaunchError;
use crate::executable::locate_executable;
use crate::time::sleep_ms;
use crossbeam_channel::{bounded, never, select, unbounded, Receiver, Sender};
use line_laser_data::{OutputMode, ResolvedLaunch, ResolvedProcess};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[cfg(unix)]
use nix::sys::signal::{killpg, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

const POLL_INTERVAL_MS: u64 = 10;
// Output of a process that escaped its group can keep a pipe open forever.
const FORWARDER_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Exit of one launched process.
#[derive(Debug)]
pub struct ProcessExit {
    pub node_name: String,
    /// `None` when the exit status could not be obtained.
    pub status: Option<ExitStatus>,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.status.map(|s| s.success()).unwrap_or(false)
    }
}

#[derive(Clone, Copy, Debug)]
struct StopTimeouts {
    sigint: Duration,
    sigterm: Duration,
}

struct Monitor {
    node_name: String,
    terminator_tx: Sender<bool>,
    thread: Option<JoinHandle<()>>,
}

/// Running processes of one launch.
///
/// Dropping the supervisor stops every process that is still running.
pub struct Supervisor {
    monitors: Vec<Monitor>,
    forwarders: Vec<JoinHandle<()>>,
    exit_rx: Receiver<ProcessExit>,
    exits: Vec<ProcessExit>,
}

/// Starts every process of `resolved`.
///
/// All executables are located before the first process is started, so a
/// missing executable starts nothing. If a later spawn fails, the processes
/// already started are stopped.
///
/// On Unix each process leads its own process group. Stopping a process
/// signals the whole group: SIGINT first, SIGTERM after
/// `settings.sigint_timeout`, SIGKILL after `settings.sigterm_timeout`.
pub fn launch(
    resolved: &ResolvedLaunch,
    settings: &LaunchSettings,
) -> Result<Supervisor, LaunchError> {
    let executables = resolved
        .processes
        .iter()
        .map(|p| locate_executable(&settings.prefixes, &p.package, &p.executable))
        .collect::<Result<Vec<_>, _>>()?;

    let timeouts = StopTimeouts {
        sigint: settings.sigint_timeout,
        sigterm: settings.sigterm_timeout,
    };
    let (exit_tx, exit_rx) = unbounded();
    let mut supervisor = Supervisor {
        monitors: Vec::new(),
        forwarders: Vec::new(),
        exit_rx,
        exits: Vec::new(),
    };

    for (process, path) in resolved.processes.iter().zip(executables) {
        let child = spawn(process, &path, settings, &mut supervisor.forwarders)?;
        info!(
            node = %process.node_name,
            pid = child.id(),
            "started {}",
            path.display()
        );

        let (terminator_tx, terminator_rx) = bounded(1);
        let node_name = process.node_name.clone();
        let tx = exit_tx.clone();
        let thread = Some(std::thread::spawn(move || {
            monitor_child(child, node_name, tx, terminator_rx, timeouts);
        }));
        supervisor.monitors.push(Monitor {
            node_name: process.node_name.clone(),
            terminator_tx,
            thread,
        });
    }

    Ok(supervisor)
}

impl Supervisor {
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.monitors.iter().map(|m| m.node_name.as_str())
    }

    /// Blocks until every process has exited. Exits are returned in the
    /// order they happened.
    pub fn wait(&mut self) -> Vec<ProcessExit> {
        self.wait_until(&never())
    }

    /// Like [`Supervisor::wait`], but stops all processes as soon as a
    /// message arrives on `stop_rx`.
    pub fn wait_until(&mut self, stop_rx: &Receiver<()>) -> Vec<ProcessExit> {
        let exit_rx = self.exit_rx.clone();
        let closed = never();
        let mut stop_open = true;
        while self.exits.len() < self.monitors.len() {
            let stop_rx = if stop_open { stop_rx } else { &closed };
            select! {
                recv(exit_rx) -> exit => match exit {
                    Ok(exit) => {
                        log_exit(&exit);
                        self.exits.push(exit);
                    }
                    Err(_) => break,
                },
                recv(stop_rx) -> stop => {
                    if stop.is_ok() {
                        info!("stopping all processes");
                        self.signal_monitors();
                    }
                    stop_open = false;
                }
            }
        }
        self.join_threads();
        std::mem::take(&mut self.exits)
    }

    /// Stops every process that is still running and waits for all of them.
    pub fn shutdown(&mut self) -> Vec<ProcessExit> {
        self.signal_monitors();
        self.wait()
    }

    fn signal_monitors(&self) {
        for monitor in &self.monitors {
            // The monitor is gone when its process already exited.
            let _ = monitor.terminator_tx.try_send(true);
        }
    }

    fn join_threads(&mut self) {
        for monitor in &mut self.monitors {
            if let Some(thread) = monitor.thread.take() {
                if thread.join().is_err() {
                    error!(node = %monitor.node_name, "monitor thread panicked");
                }
            }
        }

        let deadline = Instant::now() + FORWARDER_JOIN_TIMEOUT;
        for thread in self.forwarders.drain(..) {
            while !thread.is_finished() && Instant::now() < deadline {
                sleep_ms(POLL_INTERVAL_MS);
            }
            if !thread.is_finished() {
                warn!("output of a stopped process is still open, no longer waiting for it");
                continue;
            }
            if thread.join().is_err() {
                error!("output forwarding thread panicked");
            }
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn(
    process: &ResolvedProcess,
    path: &Path,
    settings: &LaunchSettings,
    forwarders: &mut Vec<JoinHandle<()>>,
) -> Result<Child, LaunchError> {
    let mut command = Command::new(path);
    command.args(process.ros_args()).stdin(Stdio::null());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let log = match process.output_mode {
        OutputMode::Screen => {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            None
        }
        OutputMode::Log => {
            let file = open_log(settings, &process.node_name)?;
            command.stdout(file.try_clone()?).stderr(file);
            None
        }
        OutputMode::Both => {
            let file = open_log(settings, &process.node_name)?;
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
            Some(Arc::new(Mutex::new(file)))
        }
    };

    debug!(
        node = %process.node_name,
        "command: {} {}",
        path.display(),
        process.ros_args().join(" ")
    );
    let mut child = command
        .spawn()
        .map_err(|e| LaunchError::SpawnError(process.node_name.clone(), e))?;

    if let Some(log) = log {
        if let Some(stdout) = child.stdout.take() {
            forwarders.push(forward_output(
                stdout,
                process.node_name.clone(),
                Arc::clone(&log),
                io::stdout,
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            forwarders.push(forward_output(
                stderr,
                process.node_name.clone(),
                log,
                io::stderr,
            ));
        }
    }

    Ok(child)
}

pub(crate) fn log_path(settings: &LaunchSettings, node_name: &str) -> PathBuf {
    settings.log_dir.join(format!("{}.log", node_name))
}

fn open_log(settings: &LaunchSettings, node_name: &str) -> Result<File, LaunchError> {
    fs::create_dir_all(&settings.log_dir)?;
    let path = log_path(settings, node_name);
    let file = File::options().create(true).append(true).open(&path)?;
    info!(node = %node_name, "logging to {}", path.display());
    Ok(file)
}

/// Copies lines from a process pipe to the terminal, prefixed with the node
/// name, and to the node's log file.
fn forward_output<R, W>(
    reader: R,
    node_name: String,
    log: Arc<Mutex<File>>,
    terminal: fn() -> W,
) -> JoinHandle<()>
where
    R: Read + Send + 'static,
    W: Write + 'static,
{
    std::thread::spawn(move || {
        for line in BufReader::new(reader).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    debug!(node = %node_name, "output closed: {e}");
                    return;
                }
            };
            if let Err(e) = writeln!(terminal(), "[{}] {}", node_name, line) {
                debug!(node = %node_name, "failed to write to terminal: {e}");
            }
            if let Ok(mut file) = log.lock() {
                if let Err(e) = writeln!(file, "{}", line) {
                    warn!(node = %node_name, "failed to write log: {e}");
                }
            }
        }
    })
}

fn monitor_child(
    mut child: Child,
    node_name: String,
    exit_tx: Sender<ProcessExit>,
    terminator_rx: Receiver<bool>,
    timeouts: StopTimeouts,
) {
    let status = loop {
        if do_terminate(&terminator_rx) {
            break stop_child(&mut child, &node_name, timeouts);
        }

        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => sleep_ms(POLL_INTERVAL_MS),
            Err(e) => {
                error!(node = %node_name, "failed to wait for process: {e}");
                break None;
            }
        }
    };

    // The supervisor may already be gone.
    let _ = exit_tx.send(ProcessExit { node_name, status });
}

/// Stops a running process and everything it started.
fn stop_child(child: &mut Child, node_name: &str, timeouts: StopTimeouts) -> Option<ExitStatus> {
    #[cfg(unix)]
    {
        for (signal, timeout) in [
            (Signal::SIGINT, timeouts.sigint),
            (Signal::SIGTERM, timeouts.sigterm),
        ] {
            signal_group(child, signal, node_name);
            if let Some(status) = wait_timeout(child, timeout) {
                // Leftovers of the group
                signal_group(child, Signal::SIGKILL, node_name);
                return Some(status);
            }
            warn!(node = %node_name, "process still running {:?} after {:?}", timeout, signal);
        }
        signal_group(child, Signal::SIGKILL, node_name);
    }
    #[cfg(not(unix))]
    let _ = timeouts;

    if let Err(e) = child.kill() {
        debug!(node = %node_name, "kill failed: {e}");
    }
    child.wait().ok()
}

#[cfg(unix)]
fn signal_group(child: &Child, signal: Signal, node_name: &str) {
    let group = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(group, signal) {
        debug!(node = %node_name, "failed to send {:?} to process group: {e}", signal);
    }
}

#[cfg(unix)]
fn wait_timeout(child: &mut Child, timeout: Duration) -> Option<ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {}
            Err(_) => return None,
        }
        if Instant::now() >= deadline {
            return None;
        }
        sleep_ms(POLL_INTERVAL_MS);
    }
}

fn do_terminate(terminator_rx: &Receiver<bool>) -> bool {
    terminator_rx.try_recv().unwrap_or(false)
}

fn log_exit(exit: &ProcessExit) {
    match exit.status {
        Some(status) if status.success() => info!(node = %exit.node_name, "process has finished cleanly"),
        Some(status) => warn!(node = %exit.node_name, "process has died: {status}"),
        None => warn!(node = %exit.node_name, "process exit status unknown"),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::builder::LaunchDescriptionBuilder;
    use crate::config::LaunchOverrides;
    use crate::description::{line_laser_description, PACKAGE};
    use crate::resolve::resolve;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn install_script(prefix: &Path, executable: &str, body: &str) {
        let dir = prefix.join("lib").join(PACKAGE);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(executable);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn settings(prefix: &TempDir, log_dir: &TempDir) -> LaunchSettings {
        LaunchSettings {
            prefixes: vec![prefix.path().to_path_buf()],
            log_dir: log_dir.path().to_path_buf(),
            sigint_timeout: Duration::from_millis(500),
            sigterm_timeout: Duration::from_millis(500),
        }
    }

    fn single_process(executable: &str, output_mode: OutputMode) -> ResolvedLaunch {
        let mut builder = LaunchDescriptionBuilder::new();
        builder.declare("frame_id", "base_laser_link", "").unwrap();
        builder
            .build_process_spec(
                PACKAGE,
                executable,
                executable,
                output_mode,
                vec![(
                    "frame_id".to_string(),
                    line_laser_data::ParameterValue::reference("frame_id"),
                )],
            )
            .unwrap();
        resolve(&builder.build(), &LaunchOverrides::new()).unwrap()
    }

    fn wait_for_file(path: &Path) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !path.exists() {
            assert!(Instant::now() < deadline, "{} never appeared", path.display());
            sleep_ms(10);
        }
    }

    #[cfg(target_os = "linux")]
    fn is_running(pid: i32) -> bool {
        // Zombies count as stopped.
        match fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => !matches!(
                stat.rsplit_once(')').map(|(_, rest)| rest.trim_start().chars().next()),
                Some(Some('Z')) | Some(Some('X'))
            ),
            Err(_) => false,
        }
    }

    #[test]
    fn test_launch_line_laser() {
        let prefix = tempfile::tempdir().unwrap();
        let log_dir = tempfile::tempdir().unwrap();
        install_script(prefix.path(), "n301n_serial_publisher", "exit 0");
        install_script(prefix.path(), "lidar_processor", "exit 3");

        let description = line_laser_description().unwrap();
        let resolved = resolve(&description, &LaunchOverrides::new()).unwrap();
        let mut supervisor = launch(&resolved, &settings(&prefix, &log_dir)).unwrap();
        assert_eq!(
            supervisor.node_names().collect::<Vec<_>>(),
            vec!["line_laser", "lidar_processor"]
        );

        let exits = supervisor.wait();
        assert_eq!(exits.len(), 2);
        let publisher = exits.iter().find(|e| e.node_name == "line_laser").unwrap();
        assert!(publisher.success());
        let processor = exits
            .iter()
            .find(|e| e.node_name == "lidar_processor")
            .unwrap();
        assert!(!processor.success());
        assert_eq!(processor.status.and_then(|s| s.code()), Some(3));
    }

    #[test]
    fn test_log_output_receives_parameters() {
        let prefix = tempfile::tempdir().unwrap();
        let log_dir = tempfile::tempdir().unwrap();
        install_script(prefix.path(), "echo_node", "echo \"$@\"");

        let resolved = single_process("echo_node", OutputMode::Log);
        let settings = settings(&prefix, &log_dir);
        let mut supervisor = launch(&resolved, &settings).unwrap();
        let exits = supervisor.wait();
        assert!(exits[0].success());

        let log = fs::read_to_string(log_path(&settings, "echo_node")).unwrap();
        assert_eq!(
            log.trim_end(),
            "--ros-args -r __node:=echo_node -p frame_id:=base_laser_link"
        );
    }

    #[test]
    fn test_both_output_writes_log() {
        let prefix = tempfile::tempdir().unwrap();
        let log_dir = tempfile::tempdir().unwrap();
        install_script(prefix.path(), "chatty_node", "echo out\necho err 1>&2");

        let resolved = single_process("chatty_node", OutputMode::Both);
        let settings = settings(&prefix, &log_dir);
        let mut supervisor = launch(&resolved, &settings).unwrap();
        let exits = supervisor.wait();
        assert!(exits[0].success());

        let log = fs::read_to_string(log_path(&settings, "chatty_node")).unwrap();
        let mut lines: Vec<_> = log.lines().collect();
        lines.sort();
        assert_eq!(lines, vec!["err", "out"]);
    }

    #[test]
    fn test_missing_executable_starts_nothing() {
        let prefix = tempfile::tempdir().unwrap();
        let log_dir = tempfile::tempdir().unwrap();
        let marker = prefix.path().join("started");
        install_script(
            prefix.path(),
            "n301n_serial_publisher",
            &format!("touch {}", marker.display()),
        );

        let description = line_laser_description().unwrap();
        let resolved = resolve(&description, &LaunchOverrides::new()).unwrap();
        let result = launch(&resolved, &settings(&prefix, &log_dir));
        assert!(matches!(
            result,
            Err(LaunchError::ExecutableNotFound(_, executable)) if executable == "lidar_processor"
        ));

        sleep_ms(50);
        assert!(!marker.exists());
    }

    #[test]
    fn test_shutdown_stops_running_processes() {
        let prefix = tempfile::tempdir().unwrap();
        let log_dir = tempfile::tempdir().unwrap();
        install_script(prefix.path(), "sleepy_node", "exec sleep 30");

        let resolved = single_process("sleepy_node", OutputMode::Log);
        let mut supervisor = launch(&resolved, &settings(&prefix, &log_dir)).unwrap();

        let started = Instant::now();
        let exits = supervisor.shutdown();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(exits.len(), 1);
        assert!(!exits[0].success());
    }

    #[test]
    fn test_shutdown_sends_sigint_first() {
        let prefix = tempfile::tempdir().unwrap();
        let log_dir = tempfile::tempdir().unwrap();
        let ready = prefix.path().join("ready");
        install_script(
            prefix.path(),
            "graceful_node",
            &format!(
                "trap 'echo closing uart; exit 0' INT\ntouch {}\nwhile true; do sleep 0.1; done",
                ready.display()
            ),
        );

        let resolved = single_process("graceful_node", OutputMode::Log);
        let settings = settings(&prefix, &log_dir);
        let mut supervisor = launch(&resolved, &settings).unwrap();
        wait_for_file(&ready);

        let exits = supervisor.shutdown();
        assert!(exits[0].success());
        let log = fs::read_to_string(log_path(&settings, "graceful_node")).unwrap();
        assert!(log.contains("closing uart"));
    }

    #[test]
    fn test_shutdown_escalates_to_sigkill() {
        let prefix = tempfile::tempdir().unwrap();
        let log_dir = tempfile::tempdir().unwrap();
        let ready = prefix.path().join("ready");
        install_script(
            prefix.path(),
            "stubborn_node",
            &format!(
                "trap '' INT TERM\ntouch {}\nwhile true; do sleep 0.1; done",
                ready.display()
            ),
        );

        let resolved = single_process("stubborn_node", OutputMode::Log);
        let mut supervisor = launch(&resolved, &settings(&prefix, &log_dir)).unwrap();
        wait_for_file(&ready);

        let started = Instant::now();
        let exits = supervisor.shutdown();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!exits[0].success());
    }

    #[test]
    fn test_shutdown_with_piped_output_does_not_hang() {
        let prefix = tempfile::tempdir().unwrap();
        let log_dir = tempfile::tempdir().unwrap();
        // sleep is a child of the shell and holds the output pipes
        install_script(prefix.path(), "piped_node", "sleep 8");

        let resolved = single_process("piped_node", OutputMode::Both);
        let mut supervisor = launch(&resolved, &settings(&prefix, &log_dir)).unwrap();
        sleep_ms(100);

        let started = Instant::now();
        let exits = supervisor.shutdown();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(exits.len(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_shutdown_stops_processes_started_by_node() {
        let prefix = tempfile::tempdir().unwrap();
        let log_dir = tempfile::tempdir().unwrap();
        let pid_file = prefix.path().join("helper.pid");
        let ready = prefix.path().join("ready");
        install_script(
            prefix.path(),
            "parent_node",
            &format!(
                "sleep 30 &\necho $! > {}\ntouch {}\nwait",
                pid_file.display(),
                ready.display()
            ),
        );

        let resolved = single_process("parent_node", OutputMode::Log);
        let mut supervisor = launch(&resolved, &settings(&prefix, &log_dir)).unwrap();
        wait_for_file(&ready);
        let helper: i32 = fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        assert!(is_running(helper));

        supervisor.shutdown();
        let deadline = Instant::now() + Duration::from_secs(2);
        while is_running(helper) && Instant::now() < deadline {
            sleep_ms(10);
        }
        assert!(!is_running(helper));
    }

    #[test]
    fn test_wait_until_stops_on_request() {
        let prefix = tempfile::tempdir().unwrap();
        let log_dir = tempfile::tempdir().unwrap();
        install_script(prefix.path(), "n301n_serial_publisher", "exec sleep 30");
        install_script(prefix.path(), "lidar_processor", "exec sleep 30");

        let description = line_laser_description().unwrap();
        let resolved = resolve(&description, &LaunchOverrides::new()).unwrap();
        let mut supervisor = launch(&resolved, &settings(&prefix, &log_dir)).unwrap();

        let (stop_tx, stop_rx) = bounded(1);
        stop_tx.send(()).unwrap();
        let started = Instant::now();
        let exits = supervisor.wait_until(&stop_rx);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(exits.len(), 2);
        assert!(exits.iter().all(|e| !e.success()));
    }

    #[test]
    fn test_wait_until_ignores_closed_stop_channel() {
        let prefix = tempfile::tempdir().unwrap();
        let log_dir = tempfile::tempdir().unwrap();
        install_script(prefix.path(), "quick_node", "sleep 0.2");

        let resolved = single_process("quick_node", OutputMode::Log);
        let mut supervisor = launch(&resolved, &settings(&prefix, &log_dir)).unwrap();

        let (stop_tx, stop_rx) = bounded::<()>(1);
        drop(stop_tx);
        let exits = supervisor.wait_until(&stop_rx);
        assert_eq!(exits.len(), 1);
        assert!(exits[0].success());
    }
}
