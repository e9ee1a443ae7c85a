//! Pipeline driver.
//!
//! Runs compile → adapt → introspect → publish in order on a single thread,
//! stopping at the first failure:
//!
//! ```text
//! Idle ─► Compiling ─► Adapting ─► Introspecting ─► Publishing ─► Done
//!             │            │             │               │
//!             └────────────┴──────┬──────┴───────────────┘
//!                                 ▼
//!                               Failed
//! ```
//!
//! The error of the failing stage is returned exactly as the stage produced
//! it, and no later stage is started. Artifacts written by earlier stages
//! are left in place.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::interface::InterfaceDescription;
use crate::invoke::Invoker;
use crate::stage::{self, PublishedArtifact, Stage};

/// Driver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Idle,
    Compiling,
    Adapting,
    Introspecting,
    Publishing,
    Done,
    Failed,
}

impl PipelineState {
    /// The successor on the success path; `None` for terminal states.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Compiling),
            Self::Compiling => Some(Self::Adapting),
            Self::Adapting => Some(Self::Introspecting),
            Self::Introspecting => Some(Self::Publishing),
            Self::Publishing => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Returns true for `Done` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// The stage running in this state, if any.
    pub fn stage(self) -> Option<Stage> {
        match self {
            Self::Compiling => Some(Stage::Compile),
            Self::Adapting => Some(Stage::Adapt),
            Self::Introspecting => Some(Stage::Introspect),
            Self::Publishing => Some(Stage::Publish),
            _ => None,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Compiling => "compiling",
            Self::Adapting => "adapting",
            Self::Introspecting => "introspecting",
            Self::Publishing => "publishing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.pad(name)
    }
}

/// Callback trait for pipeline progress reporting.
pub trait PipelineObserver {
    /// Called before a stage's tool is invoked.
    fn on_stage_started(&self, stage: Stage);

    /// Called when a stage produced its artifact.
    fn on_stage_completed(&self, stage: Stage, artifact: &Path, elapsed: Duration);

    /// Called when a stage fails; the run stops afterwards.
    fn on_stage_failed(&self, stage: Stage, error: &Error);

    /// Called with the component's interface once introspection succeeds.
    fn on_interface(&self, _description: &InterfaceDescription) {}
}

/// Timing of one completed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub millis: u64,
}

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub module_path: PathBuf,
    pub component_path: PathBuf,
    pub interface: InterfaceDescription,
    pub published: PublishedArtifact,
    pub timings: Vec<StageTiming>,
}

/// Sequential build-and-publish driver.
pub struct Pipeline<I: Invoker> {
    config: PipelineConfig,
    invoker: I,
    observer: Option<Box<dyn PipelineObserver>>,
    state: PipelineState,
    history: Vec<PipelineState>,
    failed_stage: Option<Stage>,
}

impl<I: Invoker> Pipeline<I> {
    /// Create an idle pipeline.
    pub fn new(config: PipelineConfig, invoker: I) -> Self {
        Self {
            config,
            invoker,
            observer: None,
            state: PipelineState::Idle,
            history: vec![PipelineState::Idle],
            failed_stage: None,
        }
    }

    /// Attach a progress observer.
    pub fn with_observer(mut self, observer: Box<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`.
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// The stage that failed, if the run ended in `Failed`.
    pub fn failed_stage(&self) -> Option<Stage> {
        self.failed_stage
    }

    /// Run all four stages.
    ///
    /// A pipeline runs once; create a new one for the next build.
    ///
    /// # Errors
    ///
    /// Returns the first stage error unchanged, [`Error::Config`] if the
    /// configuration is invalid (before any stage runs), or
    /// [`Error::InvalidState`] if the pipeline already ran.
    pub fn run(&mut self) -> Result<BuildReport> {
        if self.state != PipelineState::Idle {
            return Err(Error::InvalidState(format!(
                "pipeline already ran (state: {})",
                self.state
            )));
        }
        self.config.validate()?;
        // Tools run inside source_dir, so every path handed to them must be absolute.
        self.config.source_dir = std::path::absolute(&self.config.source_dir)?;

        let mut timings = Vec::with_capacity(Stage::ALL.len());

        self.advance();
        let module_path = self.step(
            &mut timings,
            |config, invoker| stage::compile(config, invoker),
            |module: &PathBuf| module.clone(),
        )?;

        self.advance();
        let component_path = self.step(
            &mut timings,
            |config, invoker| stage::adapt(config, &module_path, invoker),
            |component: &PathBuf| component.clone(),
        )?;

        self.advance();
        // introspection writes nothing; report the component it read
        let interface = self.step(
            &mut timings,
            |config, invoker| stage::introspect(config, &component_path, invoker),
            |_: &InterfaceDescription| component_path.clone(),
        )?;
        if let Some(observer) = &self.observer {
            observer.on_interface(&interface);
        }

        self.advance();
        let published = self.step(
            &mut timings,
            |config, invoker| stage::publish(config, &component_path, invoker),
            |published: &PublishedArtifact| published.path.clone(),
        )?;

        self.advance();
        tracing::info!(destination = %published.path.display(), "pipeline done");

        Ok(BuildReport {
            module_path,
            component_path,
            interface,
            published,
            timings,
        })
    }

    /// Move to the next state on the success path.
    fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            self.enter(next);
        }
    }

    fn enter(&mut self, state: PipelineState) {
        tracing::debug!(from = %self.state, to = %state, "pipeline transition");
        self.state = state;
        self.history.push(state);
    }

    /// Run the stage for the current state, recording timing and failure.
    fn step<T>(
        &mut self,
        timings: &mut Vec<StageTiming>,
        run: impl FnOnce(&PipelineConfig, &dyn Invoker) -> Result<T>,
        artifact: impl FnOnce(&T) -> PathBuf,
    ) -> Result<T> {
        let Some(stage) = self.state.stage() else {
            return Err(Error::InvalidState(format!("no stage runs in state {}", self.state)));
        };

        if let Some(observer) = &self.observer {
            observer.on_stage_started(stage);
        }

        let start = Instant::now();
        match run(&self.config, &self.invoker) {
            Ok(output) => {
                let elapsed = start.elapsed();
                timings.push(StageTiming {
                    stage,
                    millis: elapsed.as_millis() as u64,
                });
                if let Some(observer) = &self.observer {
                    observer.on_stage_completed(stage, &artifact(&output), elapsed);
                }
                Ok(output)
            }
            Err(err) => {
                tracing::warn!(%stage, "stage failed");
                if let Some(observer) = &self.observer {
                    observer.on_stage_failed(stage, &err);
                }
                self.failed_stage = Some(stage);
                self.enter(PipelineState::Failed);
                Err(err)
            }
        }
    }
}
