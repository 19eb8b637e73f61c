/// Which outcomes the engine records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Policy {
    /// Only successes are collected; `fail` calls are ignored.
    #[default]
    SuccessOnly,
    /// Failures are recorded as well and filtered by the validity rule.
    TrackFailures,
}

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    policy: Policy,
    gc_interval: usize,
}

impl EngineConfig {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            gc_interval: 1,
        }
    }

    /// Sets the result collection policy.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs the reachability sweep every `steps` tokens. Zero means every step.
    pub fn with_gc_interval(mut self, steps: usize) -> Self {
        self.gc_interval = steps.max(1);
        self
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn gc_interval(&self) -> usize {
        self.gc_interval
    }

    pub fn tracks_failures(&self) -> bool {
        self.policy == Policy::TrackFailures
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(Policy::SuccessOnly)
    }
}
