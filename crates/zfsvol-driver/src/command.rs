use crate::error::{DriverError, Result};
use tracing::debug;

/// Captured result of running an external program
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// First line of stdout with surrounding whitespace removed
    ///
    /// `zfs get -H -o value` prints exactly one value per line, so this is
    /// the property value for single-dataset queries.
    pub fn first_line(&self) -> &str {
        self.stdout.lines().next().unwrap_or("").trim()
    }
}

fn render<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg.as_ref());
    }
    line
}

/// Run a program and fail on non-zero exit code
pub async fn exec<S: AsRef<str>>(program: &str, args: &[S]) -> Result<CommandOutput> {
    let output = exec_unchecked(program, args).await?;

    if !output.success() {
        return Err(DriverError::command_failed(
            render(program, args),
            output.exit_code,
            output.stderr.trim(),
        ));
    }

    Ok(output)
}

/// Run a program and return its output whatever the exit code
pub async fn exec_unchecked<S: AsRef<str>>(program: &str, args: &[S]) -> Result<CommandOutput> {
    let line = render(program, args);
    debug!("Executing: {}", line);

    let output = tokio::process::Command::new(program)
        .args(args.iter().map(AsRef::as_ref))
        .output()
        .await
        .map_err(|e| DriverError::command_failed(line.clone(), -1, e.to_string()))?;

    let exit_code = output.status.code().unwrap_or(-1);
    debug!("Command exited with code {}: {}", exit_code, line);

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code,
    })
}
