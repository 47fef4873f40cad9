//! Staged progress reporting
//!
//! A [`StagedRun`] is an ordered list of named steps executed one after the
//! other on a shared context. Progress is advisory: each step is reported
//! before and after it runs, and the run stops at the first failing step.

/// Receiver of stage progress
#[cfg_attr(test, mockall::automock)]
pub trait ProgressSink {
    /// Stage `index` (0-based) of `total` is about to run
    fn stage_started(&mut self, index: usize, total: usize, name: &str);

    /// Stage finished successfully
    fn stage_finished(&mut self, index: usize, total: usize, name: &str);

    /// Stage failed; no further stages run
    fn stage_failed(&mut self, index: usize, total: usize, name: &str, error: &str);
}

/// Sink that ignores progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn stage_started(&mut self, _index: usize, _total: usize, _name: &str) {}
    fn stage_finished(&mut self, _index: usize, _total: usize, _name: &str) {}
    fn stage_failed(&mut self, _index: usize, _total: usize, _name: &str, _error: &str) {}
}

/// Failure of one stage
#[derive(Debug, thiserror::Error)]
#[error("stage '{stage}' ({index}/{total}) failed: {source}")]
pub struct StageError<E>
where
    E: std::error::Error + 'static,
{
    /// Failing stage name
    pub stage: &'static str,
    /// 1-based position
    pub index: usize,
    /// Stage count
    pub total: usize,
    /// Underlying error
    #[source]
    pub source: E,
}

type StageFn<'a, C, E> = Box<dyn FnMut(&mut C) -> Result<(), E> + 'a>;

/// Ordered named steps over a context `C`
pub struct StagedRun<'a, C, E> {
    stages: Vec<(&'static str, StageFn<'a, C, E>)>,
}

impl<C, E> std::fmt::Debug for StagedRun<'_, C, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.stages.iter().map(|(name, _)| *name).collect();
        f.debug_struct("StagedRun").field("stages", &names).finish()
    }
}

impl<C, E> Default for StagedRun<'_, C, E> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<'a, C, E> StagedRun<'a, C, E>
where
    E: std::error::Error + 'static,
{
    /// Create empty run
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    #[must_use]
    pub fn stage(
        mut self,
        name: &'static str,
        step: impl FnMut(&mut C) -> Result<(), E> + 'a,
    ) -> Self {
        self.stages.push((name, Box::new(step)));
        self
    }

    /// Stage names in order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|(name, _)| *name).collect()
    }

    /// Execute every stage in order
    ///
    /// # Errors
    /// Returns the first failing stage; later stages do not run
    pub fn run<P: ProgressSink + ?Sized>(
        self,
        context: &mut C,
        progress: &mut P,
    ) -> Result<(), StageError<E>> {
        let total = self.stages.len();
        for (index, (name, mut step)) in self.stages.into_iter().enumerate() {
            progress.stage_started(index, total, name);
            tracing::debug!("stage {}/{}: {}", index + 1, total, name);
            if let Err(source) = step(context) {
                tracing::error!("stage '{}' failed: {}", name, source);
                progress.stage_failed(index, total, name, &source.to_string());
                return Err(StageError {
                    stage: name,
                    index: index + 1,
                    total,
                    source,
                });
            }
            progress.stage_finished(index, total, name);
        }
        Ok(())
    }
}
