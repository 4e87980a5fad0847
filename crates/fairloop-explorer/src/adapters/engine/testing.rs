//! Iteration driver

use super::hooks::{CancellationToken, TestHooks};
use super::{compose_strategy, execute_iteration, record_outcome, record_panic, Engine, RunBudget, RuntimeFactory};
use crate::domain::config::Configuration;
use crate::domain::error::EngineResult;
use crate::domain::report::TestReport;
use crate::domain::strategy::SchedulingStrategy;
use std::time::Duration;
use tracing::{info, warn};

/// Runs iterations of a program under one composed strategy
///
/// # Example
///
/// ```rust,ignore
/// let config = ConfigurationBuilder::new().iterations(1_000).build()?;
/// let mut engine = TestingEngine::new(config, || PingPong::new())?;
/// let report = engine.run()?;
/// ```
pub struct TestingEngine<F> {
    config: Configuration,
    factory: F,
    strategy: Box<dyn SchedulingStrategy>,
    hooks: TestHooks,
    cancel: CancellationToken,
}

impl<F: RuntimeFactory> TestingEngine<F> {
    /// Engine with the strategy selected by `config`
    pub fn new(config: Configuration, factory: F) -> EngineResult<Self> {
        config.validate()?;
        let strategy = compose_strategy(&config)?;
        Ok(Self::assemble(config, factory, strategy))
    }

    /// Engine driven by an explicitly constructed strategy
    pub fn with_strategy(config: Configuration, factory: F, strategy: Box<dyn SchedulingStrategy>) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::assemble(config, factory, strategy))
    }

    fn assemble(config: Configuration, factory: F, strategy: Box<dyn SchedulingStrategy>) -> Self {
        Self {
            config,
            factory,
            strategy,
            hooks: TestHooks::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Install hooks
    #[must_use]
    pub fn with_hooks(mut self, hooks: TestHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Share an existing cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token stopping the run at the next iteration boundary
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Active configuration
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Active strategy
    pub fn strategy(&self) -> &dyn SchedulingStrategy {
        self.strategy.as_ref()
    }

    /// Run iterations until the budget is spent, the strategy has nothing
    /// left to explore, or the run is cancelled
    pub fn run(&mut self) -> EngineResult<TestReport> {
        let description = self.strategy.description();
        info!(
            target: "fairloop::engine",
            "🚀 Testing with {} ({} iterations)",
            description,
            self.config.scheduling_iterations
        );

        self.strategy.reset();
        let mut report = TestReport::new(description);
        let budget = RunBudget::new(&self.config);
        let mut completed = 0;

        let result = loop {
            if let Some(reason) = budget.stop_reason(completed, &self.cancel) {
                info!(target: "fairloop::engine", "Stopping after {} iterations: {}", completed, reason);
                break Ok(());
            }

            let outcome = execute_iteration(
                &self.factory,
                self.strategy.as_mut(),
                &mut self.hooks,
                self.config.enable_debugging,
            );
            completed += 1;

            match outcome {
                Ok(outcome) => match record_outcome(&mut report, outcome, self.config.attach_bug_trace) {
                    Ok(true) => info!(
                        target: "fairloop::engine",
                        "🐛 Bug found in iteration {}: {}",
                        completed,
                        report.bug_traces.last().map_or("", |b| b.message.as_str())
                    ),
                    Ok(false) => {}
                    Err(err) => break Err(err),
                },
                Err(panic) => {
                    warn!(target: "fairloop::engine", "⚠️  Iteration {} panicked: {}", completed, panic);
                    record_panic(&mut report, panic, self.strategy.is_fair());
                }
            }

            if !self.strategy.prepare_for_next_iteration() {
                info!(target: "fairloop::engine", "✅ Strategy explored every schedule after {} iterations", completed);
                break Ok(());
            }
        };

        self.hooks.teardown();
        result?;

        info!(
            target: "fairloop::engine",
            "Finished {} iterations in {:?}: {} bug(s)",
            report.explored_schedules_count,
            budget.elapsed(),
            report.num_of_found_bugs
        );
        Ok(report)
    }
}

impl<F: RuntimeFactory> Engine for TestingEngine<F> {
    type Report = TestReport;

    fn run(&mut self) -> EngineResult<TestReport> {
        TestingEngine::run(self)
    }

    fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn timeout(&self) -> Option<Duration> {
        self.config.timeout
    }
}
