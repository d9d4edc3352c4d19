//! Caller-side preconditions for large runs.
//!
//! Neither check stops a run on its own. They return a verdict and the caller decides whether
//! to proceed, typically after asking the user.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_MAX_INSTANCES: usize = 2_000_000;
pub const DEFAULT_MIN_MEMORY_REMAINING_MB: u64 = 3000;

/// Limits checked before and after generating samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GuardConfig {
    /// Instance count above which the caller should confirm.
    pub max_instances: usize,
    /// Whether the available-memory check is active.
    pub memory_barrier: bool,
    /// Memory that must remain available, in megabytes.
    pub min_memory_remaining_mb: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_instances: DEFAULT_MAX_INSTANCES,
            memory_barrier: true,
            min_memory_remaining_mb: DEFAULT_MIN_MEMORY_REMAINING_MB,
        }
    }
}

impl GuardConfig {
    pub fn with_max_instances(mut self, max_instances: usize) -> Self {
        self.max_instances = max_instances;
        self
    }

    pub fn with_memory_barrier(mut self, enabled: bool, min_remaining_mb: u64) -> Self {
        self.memory_barrier = enabled;
        self.min_memory_remaining_mb = min_remaining_mb;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceCheck {
    Within,
    Exceeded { count: usize, limit: usize },
}

impl InstanceCheck {
    pub fn is_exceeded(self) -> bool {
        matches!(self, InstanceCheck::Exceeded { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryCheck {
    Sufficient,
    BelowBarrier { available_mb: u64, required_mb: u64 },
}

impl MemoryCheck {
    pub fn is_sufficient(self) -> bool {
        matches!(self, MemoryCheck::Sufficient)
    }
}

/// Source of the currently available system memory, in megabytes.
pub trait MemoryProbe {
    fn available_mb(&self) -> u64;
}

impl<F> MemoryProbe for F
where
    F: Fn() -> u64,
{
    fn available_mb(&self) -> u64 {
        self()
    }
}

/// Evaluates a [`GuardConfig`].
#[derive(Clone, Copy, Debug, Default)]
pub struct InstanceGuard {
    config: GuardConfig,
}

impl InstanceGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn check(&self, count: usize) -> InstanceCheck {
        if count > self.config.max_instances {
            warn!(
                "{} instances exceed the configured limit of {}.",
                count, self.config.max_instances
            );
            InstanceCheck::Exceeded {
                count,
                limit: self.config.max_instances,
            }
        } else {
            InstanceCheck::Within
        }
    }

    /// Compares `available_mb` against the barrier. Always sufficient when the barrier is off.
    pub fn check_memory(&self, available_mb: u64) -> MemoryCheck {
        if !self.config.memory_barrier || available_mb >= self.config.min_memory_remaining_mb {
            return MemoryCheck::Sufficient;
        }
        warn!(
            "Only {} MB available, {} MB required.",
            available_mb, self.config.min_memory_remaining_mb
        );
        MemoryCheck::BelowBarrier {
            available_mb,
            required_mb: self.config.min_memory_remaining_mb,
        }
    }

    pub fn probe_memory(&self, probe: &dyn MemoryProbe) -> MemoryCheck {
        if !self.config.memory_barrier {
            return MemoryCheck::Sufficient;
        }
        self.check_memory(probe.available_mb())
    }
}
