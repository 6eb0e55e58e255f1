use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use sweep_core::{SweepSpec, TrialConfig};

/// Raw output of one simulator invocation. `exit_code` is `None` when
/// the child died to a signal, which callers treat as failure.
#[derive(Debug, Clone)]
pub struct SimOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl SimOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// The simulator as a capability: anything that can take a grid point
/// and produce the two output streams plus an exit status. Tests
/// substitute fakes; production uses [`ProcessSimulator`].
pub trait Simulator {
    fn run(&self, config: &TrialConfig) -> Result<SimOutput>;
}

/// Runs the real simulator executable. The command is a program plus
/// fixed leading arguments (e.g. `gleam run`); the grid arguments are
/// appended positionally per invocation.
pub struct ProcessSimulator {
    command: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessSimulator {
    pub fn new(command: Vec<String>, timeout: Option<Duration>) -> Self {
        ProcessSimulator { command, timeout }
    }

    pub fn from_spec(spec: &SweepSpec) -> Self {
        ProcessSimulator::new(
            spec.simulator.clone(),
            spec.timeout_secs.map(Duration::from_secs),
        )
    }

    /// Full argument vector for one configuration, program included.
    pub fn argv(&self, config: &TrialConfig) -> Vec<String> {
        let mut argv = self.command.clone();
        argv.extend(config.args());
        argv
    }

    fn await_exit(&self, child: &mut Child, argv: &[String]) -> Result<ExitStatus> {
        let Some(limit) = self.timeout else {
            return Ok(child.wait()?);
        };
        let deadline = Instant::now() + limit;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(anyhow!(
                    "simulator exceeded {}s timeout: {:?}",
                    limit.as_secs(),
                    argv
                ));
            }
            thread::sleep(Duration::from_millis(25));
        }
    }
}

impl Simulator for ProcessSimulator {
    fn run(&self, config: &TrialConfig) -> Result<SimOutput> {
        let argv = self.argv(config);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("simulator command is empty"))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to launch simulator: {argv:?}"))?;

        // Drain both pipes off-thread so a chatty child can never
        // deadlock against a full pipe buffer while we wait on it.
        let stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("child stdout was not captured"))?;
        let stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("child stderr was not captured"))?;
        let stdout_reader = spawn_reader(stdout_pipe);
        let stderr_reader = spawn_reader(stderr_pipe);

        let status = self.await_exit(&mut child, &argv)?;
        let stdout = join_reader(stdout_reader, "stdout")?;
        let stderr = join_reader(stderr_reader, "stderr")?;

        Ok(SimOutput {
            stdout,
            stderr,
            exit_code: status.code(),
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<std::io::Result<String>> {
    thread::spawn(move || {
        let mut buf = String::new();
        pipe.read_to_string(&mut buf)?;
        Ok(buf)
    })
}

fn join_reader(
    handle: thread::JoinHandle<std::io::Result<String>>,
    stream: &str,
) -> Result<String> {
    handle
        .join()
        .map_err(|_| anyhow!("{stream} reader thread panicked"))?
        .with_context(|| format!("failed reading simulator {stream}"))
}
