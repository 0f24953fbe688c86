use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::application::ports::{
    CommandSpec, LineSink, OutputLine, OutputStream, ProcessError, ProcessOutput, ProcessRunner,
    RunOptions,
};

/// Runs external programs directly (no shell) under a hard wall-clock deadline.
/// On expiry the child's whole process group is killed and its output readers
/// are torn down.
#[derive(Debug, Default, Clone)]
pub struct ProcessSupervisor;

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for ProcessSupervisor {
    async fn run(
        &self,
        command: &CommandSpec,
        options: RunOptions,
    ) -> Result<ProcessOutput, ProcessError> {
        let program = command.program.display().to_string();
        tracing::debug!(program = %program, args = ?command.args, "Launching process");

        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own group, so a timeout can take down whatever the tool started.
        #[cfg(unix)]
        process.process_group(0);

        let mut child = process.spawn().map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;
        let group = child.id();

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("failed to capture stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("failed to capture stderr"))?;

        let mut stdout_reader = tokio::spawn(collect_lines(
            stdout,
            OutputStream::Stdout,
            options.line_sink.clone(),
        ));
        let mut stderr_reader =
            tokio::spawn(collect_lines(stderr, OutputStream::Stderr, options.line_sink));

        let finished = tokio::time::timeout(options.timeout, async {
            let status = child.wait().await?;
            let stdout = join_reader(&mut stdout_reader).await?;
            let stderr = join_reader(&mut stderr_reader).await?;
            Ok::<_, io::Error>(ProcessOutput {
                exit_code: status.code(),
                stdout,
                stderr,
            })
        })
        .await;

        match finished {
            Ok(output) => {
                let output = output?;
                tracing::debug!(program = %program, exit_code = ?output.exit_code, "Process exited");
                Ok(output)
            }
            Err(_) => {
                tracing::warn!(
                    program = %program,
                    timeout_secs = options.timeout.as_secs(),
                    "Process exceeded its deadline; killing"
                );
                kill_process_group(group, &program);
                if child.id().is_some()
                    && let Err(e) = child.kill().await
                {
                    tracing::warn!(program = %program, error = %e, "Failed to kill process");
                }
                stdout_reader.abort();
                stderr_reader.abort();
                Err(ProcessError::TimedOut(options.timeout))
            }
        }
    }
}

#[cfg(unix)]
fn kill_process_group(group: Option<u32>, program: &str) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    // The group outlives its leader, so this works even after the direct child was reaped.
    let Some(pid) = group.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        tracing::warn!(program = %program, pid = pid, error = %e, "Failed to kill process group");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_group: Option<u32>, _program: &str) {}

async fn join_reader(reader: &mut JoinHandle<io::Result<String>>) -> io::Result<String> {
    reader.await.map_err(io::Error::other)?
}

/// Reads `reader` to the end, keeping every byte and forwarding each line to `sink`.
async fn collect_lines<R>(
    reader: R,
    stream: OutputStream,
    sink: Option<LineSink>,
) -> io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut captured = String::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        captured.push_str(&line);

        if let Some(sink) = &sink {
            let line = line.trim_end_matches(['\r', '\n']).to_string();
            // A closed receiver only means nobody is watching anymore.
            let _ = sink.send(OutputLine { stream, line });
        }
    }

    Ok(captured)
}
