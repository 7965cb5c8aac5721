//! Batch driver.
//!
//! Enumerates, plans, then spawns one task per file into a [`JoinSet`] and
//! waits for all of them. Tasks never talk to each other; a failing file is
//! reported and the rest carry on.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use mmdr_render::{RenderOptions, Renderer};
use tokio::task::JoinSet;

use crate::BatchError;
use crate::event::{BatchEvent, Reporter};
use crate::plan::{RenderTask, plan};
use crate::scanner::enumerate;

/// A file that rendered successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// A file that failed to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRender {
    pub input: PathBuf,
    pub message: String,
}

/// Per-file outcomes of a finished batch.
///
/// Entries are in completion order, not enumeration order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub rendered: Vec<RenderedFile>,
    pub failed: Vec<FailedRender>,
}

impl BatchReport {
    /// Number of files that were dispatched.
    #[must_use]
    pub fn total(&self) -> usize {
        self.rendered.len() + self.failed.len()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

struct TaskOutcome {
    input: PathBuf,
    result: Result<PathBuf, String>,
}

/// Renders every diagram-source file of a directory.
pub struct BatchRenderer<R> {
    renderer: Arc<R>,
    options: RenderOptions,
}

impl<R: Renderer> BatchRenderer<R> {
    /// Create a batch renderer using the default [`RenderOptions`].
    pub fn new(renderer: R) -> Self {
        Self {
            renderer: Arc::new(renderer),
            options: RenderOptions::default(),
        }
    }

    /// The renderer shared by all tasks.
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Render every `.mmd` file in `source_dir` into `output_dir`.
    ///
    /// Emits [`BatchEvent::Discovered`] before any task starts, then one
    /// `Started` and one `Succeeded`/`Failed` event per file. Returns once
    /// every task has finished.
    ///
    /// # Errors
    ///
    /// Returns a [`BatchError`] if `source_dir` cannot be listed, two inputs
    /// map to the same output, or `output_dir` cannot be created. Nothing is
    /// rendered in those cases. Per-file failures are not errors; they are in
    /// [`BatchReport::failed`].
    pub async fn run(
        &self,
        source_dir: &Path,
        output_dir: &Path,
        reporter: Arc<dyn Reporter>,
    ) -> Result<BatchReport, BatchError> {
        let start = Instant::now();

        let inputs = enumerate(source_dir)?;
        let tasks = plan(&inputs, output_dir)?;

        if !tasks.is_empty() {
            tokio::fs::create_dir_all(output_dir)
                .await
                .map_err(|source| BatchError::CreateOutputDir {
                    path: output_dir.to_path_buf(),
                    source,
                })?;
        }

        reporter.report(&BatchEvent::Discovered { count: tasks.len() });

        let dispatched: Vec<PathBuf> = tasks.iter().map(|t| t.input.path.clone()).collect();
        let mut set = JoinSet::new();
        for task in tasks {
            set.spawn(render_one(
                Arc::clone(&self.renderer),
                Arc::clone(&reporter),
                task,
                self.options.clone(),
            ));
        }

        let mut report = BatchReport::default();
        let mut finished = HashSet::with_capacity(dispatched.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcome) => {
                    finished.insert(outcome.input.clone());
                    match outcome.result {
                        Ok(output) => report.rendered.push(RenderedFile {
                            input: outcome.input,
                            output,
                        }),
                        Err(message) => report.failed.push(FailedRender {
                            input: outcome.input,
                            message,
                        }),
                    }
                }
                Err(e) => tracing::error!("render task aborted: {e}"),
            }
        }

        // Tasks that panicked never produced an outcome.
        for input in dispatched.into_iter().filter(|i| !finished.contains(i)) {
            let message = "render task panicked".to_owned();
            reporter.report(&BatchEvent::Failed {
                input: input.clone(),
                message: message.clone(),
            });
            report.failed.push(FailedRender { input, message });
        }

        tracing::info!(
            rendered = report.rendered.len(),
            failed = report.failed.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "batch finished"
        );

        Ok(report)
    }
}

async fn render_one<R: Renderer>(
    renderer: Arc<R>,
    reporter: Arc<dyn Reporter>,
    task: RenderTask,
    options: RenderOptions,
) -> TaskOutcome {
    let RenderTask { input, output } = task;
    let input = input.path;

    reporter.report(&BatchEvent::Started {
        input: input.clone(),
        output: output.clone(),
    });

    match renderer.render(&input, &output, &options).await {
        Ok(()) => {
            reporter.report(&BatchEvent::Succeeded {
                input: input.clone(),
                output: output.clone(),
            });
            TaskOutcome {
                input,
                result: Ok(output),
            }
        }
        Err(e) => {
            let message = e.to_string();
            tracing::debug!(input = %input.display(), error = ?e, "render failed");
            reporter.report(&BatchEvent::Failed {
                input: input.clone(),
                message: message.clone(),
            });
            TaskOutcome {
                input,
                result: Err(message),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use mmdr_render::{MOCK_PNG, MockRenderer, RenderError};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::event::RecordingReporter;

    fn write_sources(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), "graph TD;\n  A-->B\n").unwrap();
        }
    }

    fn sorted_inputs(renderer: &MockRenderer) -> Vec<String> {
        let mut names: Vec<String> = renderer
            .calls()
            .iter()
            .map(|c| c.input.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    async fn run_batch(
        batch: &BatchRenderer<MockRenderer>,
        source: &Path,
        output: &Path,
    ) -> (Result<BatchReport, BatchError>, Vec<BatchEvent>) {
        let reporter = Arc::new(RecordingReporter::new());
        let result = batch
            .run(source, output, Arc::clone(&reporter) as Arc<dyn Reporter>)
            .await;
        (result, reporter.events())
    }

    #[tokio::test]
    async fn test_renders_only_mermaid_files() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["a.mmd", "b.mmd", "notes.txt"]);
        let batch = BatchRenderer::new(MockRenderer::new());

        let (result, events) = run_batch(&batch, tmp.path(), tmp.path()).await;
        let report = result.unwrap();

        assert_eq!(events[0], BatchEvent::Discovered { count: 2 });
        assert_eq!(sorted_inputs(batch.renderer()), vec!["a.mmd", "b.mmd"]);
        assert_eq!(report.rendered.len(), 2);
        assert!(!report.has_failures());
        assert_eq!(fs::read(tmp.path().join("a.png")).unwrap(), MOCK_PNG);
        assert_eq!(fs::read(tmp.path().join("b.png")).unwrap(), MOCK_PNG);
        assert!(!tmp.path().join("notes.png").exists());
    }

    #[tokio::test]
    async fn test_exactly_one_attempt_per_file() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["a.mmd", "b.mmd", "c.mmd"]);
        let batch = BatchRenderer::new(MockRenderer::new().with_failure("b.mmd", "bad"));

        let (result, events) = run_batch(&batch, tmp.path(), tmp.path()).await;
        let report = result.unwrap();

        assert_eq!(sorted_inputs(batch.renderer()), vec!["a.mmd", "b.mmd", "c.mmd"]);
        assert_eq!(report.total(), 3);

        let started = events
            .iter()
            .filter(|e| matches!(e, BatchEvent::Started { .. }))
            .count();
        let finished = events
            .iter()
            .filter(|e| matches!(e, BatchEvent::Succeeded { .. } | BatchEvent::Failed { .. }))
            .count();
        assert_eq!(started, 3);
        assert_eq!(finished, 3);
    }

    #[tokio::test]
    async fn test_passes_fixed_options_and_paths() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["flow.mmd"]);
        let batch = BatchRenderer::new(MockRenderer::new());

        let (result, _) = run_batch(&batch, tmp.path(), tmp.path()).await;
        result.unwrap();

        let calls = batch.renderer().calls();
        let dir = std::path::absolute(tmp.path()).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].input, dir.join("flow.mmd"));
        assert_eq!(calls[0].output, tmp.path().join("flow.png"));
        assert_eq!(calls[0].options, RenderOptions::default());
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["readme.md"]);
        let batch = BatchRenderer::new(MockRenderer::new());

        let (result, events) = run_batch(&batch, tmp.path(), tmp.path()).await;
        let report = result.unwrap();

        assert_eq!(events, vec![BatchEvent::Discovered { count: 0 }]);
        assert!(batch.renderer().calls().is_empty());
        assert_eq!(report.total(), 0);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_others() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["good.mmd", "broken.mmd"]);
        let batch = BatchRenderer::new(
            MockRenderer::new().with_failure("broken.mmd", "Parse error on line 2"),
        );

        let (result, events) = run_batch(&batch, tmp.path(), tmp.path()).await;
        let report = result.unwrap();

        assert!(tmp.path().join("good.png").exists());
        assert!(!tmp.path().join("broken.png").exists());

        assert_eq!(report.rendered.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].input.ends_with("broken.mmd"));
        assert!(report.failed[0].message.contains("Parse error on line 2"));

        let failure = events
            .iter()
            .find_map(|e| match e {
                BatchEvent::Failed { input, message } => Some((input, message)),
                _ => None,
            })
            .expect("failure event");
        assert!(failure.0.ends_with("broken.mmd"));
        assert!(failure.1.contains("Parse error on line 2"));
    }

    #[tokio::test]
    async fn test_waits_for_slow_tasks() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["fast.mmd", "slow.mmd"]);
        let batch = BatchRenderer::new(
            MockRenderer::new().with_delay("slow.mmd", Duration::from_millis(200)),
        );

        let (result, events) = run_batch(&batch, tmp.path(), tmp.path()).await;
        result.unwrap();

        assert!(tmp.path().join("slow.png").exists());
        assert!(matches!(events.last(), Some(BatchEvent::Succeeded { .. })));
    }

    #[tokio::test]
    async fn test_tasks_run_concurrently() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["a.mmd", "b.mmd", "c.mmd", "d.mmd"]);
        let delay = Duration::from_millis(300);
        let batch = BatchRenderer::new(
            MockRenderer::new()
                .with_delay("a.mmd", delay)
                .with_delay("b.mmd", delay)
                .with_delay("c.mmd", delay)
                .with_delay("d.mmd", delay),
        );

        let start = Instant::now();
        let (result, _) = run_batch(&batch, tmp.path(), tmp.path()).await;
        result.unwrap();

        // Sequential execution would take at least 4 * delay.
        assert!(start.elapsed() < delay * 3, "took {:?}", start.elapsed());
    }

    #[tokio::test]
    async fn test_separate_output_dir_is_created() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("figures");
        let output = tmp.path().join("build/png");
        fs::create_dir(&source).unwrap();
        write_sources(&source, &["seq.mmd"]);
        let batch = BatchRenderer::new(MockRenderer::new());

        let (result, _) = run_batch(&batch, &source, &output).await;
        result.unwrap();

        assert!(output.join("seq.png").exists());
        assert!(!source.join("seq.png").exists());
    }

    #[tokio::test]
    async fn test_missing_source_dir_renders_nothing() {
        let tmp = TempDir::new().unwrap();
        let batch = BatchRenderer::new(MockRenderer::new());

        let (result, events) = run_batch(&batch, &tmp.path().join("missing"), tmp.path()).await;

        assert!(matches!(result, Err(BatchError::ReadDir { .. })));
        assert!(events.is_empty());
        assert!(batch.renderer().calls().is_empty());
    }

    #[tokio::test]
    async fn test_output_dir_creation_failure_renders_nothing() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["a.mmd"]);
        let blocker = tmp.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let batch = BatchRenderer::new(MockRenderer::new());

        let (result, events) = run_batch(&batch, tmp.path(), &blocker.join("out")).await;

        assert!(matches!(result, Err(BatchError::CreateOutputDir { .. })));
        assert!(events.is_empty());
        assert!(batch.renderer().calls().is_empty());
    }

    struct PanickingRenderer;

    impl Renderer for PanickingRenderer {
        async fn render(
            &self,
            input: &Path,
            output: &Path,
            _options: &RenderOptions,
        ) -> Result<(), RenderError> {
            if input.ends_with("boom.mmd") {
                panic!("renderer bug");
            }
            tokio::fs::write(output, b"ok").await?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_panicking_task_is_reported_as_failure() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["boom.mmd", "fine.mmd"]);
        let batch = BatchRenderer::new(PanickingRenderer);
        let reporter = Arc::new(RecordingReporter::new());

        let report = batch
            .run(
                tmp.path(),
                tmp.path(),
                Arc::clone(&reporter) as Arc<dyn Reporter>,
            )
            .await
            .unwrap();

        assert_eq!(report.rendered.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].input.ends_with("boom.mmd"));
        assert!(reporter.events().iter().any(|e| matches!(
            e,
            BatchEvent::Failed { input, .. } if input.ends_with("boom.mmd")
        )));
    }
}
