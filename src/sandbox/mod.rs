pub mod language;

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;

use crate::config::SandboxConfig;
use language::Language;

/// Distinguished ways a sandbox run can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The compiler exited non-zero; the diagnostic is in `stderr`.
    Compile,
    /// The program ran but exited non-zero.
    Runtime,
    /// The execution phase exceeded the wall-clock bound.
    Timeout,
    /// The interpreter or compiler is not present in the environment.
    ToolMissing,
}

/// Result of one sandbox invocation. Created once, never mutated.
#[derive(Debug)]
pub struct ExecutionResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    pub failure: Option<FailureKind>,
}

impl ExecutionResult {
    fn passed(stdout: String, stderr: String, elapsed: Duration) -> Self {
        Self {
            success: true,
            stdout,
            stderr,
            elapsed,
            failure: None,
        }
    }

    fn failed(failure: Option<FailureKind>, stderr: String, elapsed: Duration) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr,
            elapsed,
            failure,
        }
    }
}

/// Seam between the workflow engines and the real sandbox, so engine tests
/// can substitute canned execution results.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn run(&self, primary: &str, harness: &str, language: Language) -> ExecutionResult;
}

/// Compiles and runs one code unit inside a single-use workspace.
///
/// Every call allocates a fresh temporary directory and removes it before
/// returning, on all paths: the directory guard lives for the scope of
/// `run`, and a timed-out child is killed when its wait future is dropped.
pub struct Sandbox {
    config: SandboxConfig,
}

impl Sandbox {
    pub fn new(config: &SandboxConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn limit(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    fn allocate_workspace(&self) -> std::io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("crucible-sbx-");
        match &self.config.base_dir {
            Some(base) => builder.tempdir_in(base),
            None => builder.tempdir(),
        }
    }

    async fn run_interpreted(
        &self,
        workspace: &Path,
        source: &str,
        language: Language,
    ) -> ExecutionResult {
        let source_path = workspace.join(source_file_name(language, source));
        if let Err(e) = tokio::fs::write(&source_path, source).await {
            return ExecutionResult::failed(
                None,
                format!("failed to write source file: {e}"),
                Duration::ZERO,
            );
        }

        let interpreter = match language {
            Language::Python => &self.config.python_bin,
            Language::JavaScript => &self.config.node_bin,
            _ => unreachable!("interpreted dispatch on compiled language"),
        };

        self.execute(interpreter, &[source_path.as_os_str().to_os_string()], workspace)
            .await
    }

    async fn run_cpp(&self, workspace: &Path, source: &str) -> ExecutionResult {
        let source_path = workspace.join(source_file_name(Language::Cpp, source));
        if let Err(e) = tokio::fs::write(&source_path, source).await {
            return ExecutionResult::failed(
                None,
                format!("failed to write source file: {e}"),
                Duration::ZERO,
            );
        }

        let binary_path = workspace.join("program");
        if let Some(failure) = self
            .compile(
                &self.config.cxx_bin,
                &[
                    source_path.as_os_str().to_os_string(),
                    "-o".into(),
                    binary_path.as_os_str().to_os_string(),
                ],
                workspace,
            )
            .await
        {
            return failure;
        }

        self.execute_program(&binary_path, &[], workspace).await
    }

    async fn run_java(&self, workspace: &Path, source: &str) -> ExecutionResult {
        // Java insists the file is named after its public class; scan for the
        // declared name before writing anything.
        let class_name =
            language::java_main_class(source).unwrap_or_else(|| "Main".to_string());
        let source_path = workspace.join(format!("{class_name}.java"));
        if let Err(e) = tokio::fs::write(&source_path, source).await {
            return ExecutionResult::failed(
                None,
                format!("failed to write source file: {e}"),
                Duration::ZERO,
            );
        }

        if let Some(failure) = self
            .compile(
                &self.config.javac_bin,
                &[source_path.as_os_str().to_os_string()],
                workspace,
            )
            .await
        {
            return failure;
        }

        self.execute(
            &self.config.java_bin,
            &["-cp".into(), workspace.as_os_str().to_os_string(), class_name.into()],
            workspace,
        )
        .await
    }

    /// Run the compiler to completion with no timeout. Returns `Some` with a
    /// terminal result if compilation cannot produce a runnable artifact.
    async fn compile(
        &self,
        compiler: &str,
        args: &[std::ffi::OsString],
        workspace: &Path,
    ) -> Option<ExecutionResult> {
        let output = Command::new(compiler)
            .args(args)
            .current_dir(workspace)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => None,
            Ok(out) => Some(ExecutionResult::failed(
                Some(FailureKind::Compile),
                String::from_utf8_lossy(&out.stderr).into_owned(),
                Duration::ZERO,
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Some(ExecutionResult::failed(
                    Some(FailureKind::ToolMissing),
                    format!("`{compiler}` not found in the execution environment"),
                    Duration::ZERO,
                ))
            }
            Err(e) => Some(ExecutionResult::failed(
                None,
                format!("failed to invoke `{compiler}`: {e}"),
                Duration::ZERO,
            )),
        }
    }

    async fn execute_program(
        &self,
        program: &Path,
        args: &[std::ffi::OsString],
        workspace: &Path,
    ) -> ExecutionResult {
        self.execute(&program.to_string_lossy(), args, workspace).await
    }

    /// Spawn the program and wait for it under the wall-clock bound.
    async fn execute(
        &self,
        program: &str,
        args: &[std::ffi::OsString],
        workspace: &Path,
    ) -> ExecutionResult {
        let limit = self.limit();

        let child = Command::new(program)
            .args(args)
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return ExecutionResult::failed(
                    Some(FailureKind::ToolMissing),
                    format!("`{program}` not found in the execution environment"),
                    Duration::ZERO,
                );
            }
            Err(e) => {
                return ExecutionResult::failed(
                    None,
                    format!("failed to spawn `{program}`: {e}"),
                    Duration::ZERO,
                );
            }
        };

        let started = Instant::now();
        match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(Ok(out)) => {
                let elapsed = started.elapsed();
                let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
                if out.status.success() {
                    ExecutionResult::passed(stdout, stderr, elapsed)
                } else {
                    ExecutionResult {
                        success: false,
                        stdout,
                        stderr,
                        elapsed,
                        failure: Some(FailureKind::Runtime),
                    }
                }
            }
            Ok(Err(e)) => ExecutionResult::failed(
                None,
                format!("failed waiting for `{program}`: {e}"),
                started.elapsed(),
            ),
            Err(_) => {
                // Dropping the wait future drops the child handle, which
                // kills the still-running process (kill_on_drop).
                ExecutionResult::failed(
                    Some(FailureKind::Timeout),
                    format!("execution timed out after {}s", limit.as_secs()),
                    limit,
                )
            }
        }
    }
}

#[async_trait]
impl CodeExecutor for Sandbox {
    async fn run(&self, primary: &str, harness: &str, language: Language) -> ExecutionResult {
        let workspace = match self.allocate_workspace() {
            Ok(dir) => dir,
            Err(e) => {
                return ExecutionResult::failed(
                    None,
                    format!("failed to allocate workspace: {e}"),
                    Duration::ZERO,
                );
            }
        };

        let source = combine_source(primary, harness);

        // `workspace` is dropped when this scope ends, removing the
        // directory and everything written into it on every return path.
        match language {
            Language::Python | Language::JavaScript => {
                self.run_interpreted(workspace.path(), &source, language).await
            }
            Language::Cpp => self.run_cpp(workspace.path(), &source).await,
            Language::Java => self.run_java(workspace.path(), &source).await,
        }
    }
}

/// Concatenate harness after primary. The ordering is load-bearing: the
/// harness entry point references names the primary defines, so the primary
/// must come first. Harnesses for compiled languages are expected to carry
/// their own include/import lines.
fn combine_source(primary: &str, harness: &str) -> String {
    if harness.is_empty() {
        primary.to_string()
    } else {
        format!("{primary}\n\n{harness}")
    }
}

fn source_file_name(language: Language, source: &str) -> String {
    match language {
        Language::Java => {
            let class_name =
                language::java_main_class(source).unwrap_or_else(|| "Main".to_string());
            format!("{class_name}.java")
        }
        _ => format!("program.{}", language.source_extension()),
    }
}
