//! Cooperative cancellation.
//!
//! Long-running loops poll a [`Cancellation`] at fixed checkpoints (every sampler step or
//! level, and every tile boundary) and stop with whatever they have accepted so far.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Pollable stop signal.
pub trait Cancellation {
    fn is_cancelled(&self) -> bool;
}

/// Never cancels.
impl Cancellation for () {
    #[inline]
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl Cancellation for AtomicBool {
    #[inline]
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<C: Cancellation + ?Sized> Cancellation for Arc<C> {
    #[inline]
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<C: Cancellation + ?Sized> Cancellation for &C {
    #[inline]
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Cancellation backed by a user-provided closure.
pub struct FnCancel<F>
where
    F: Fn() -> bool,
{
    f: F,
}

impl<F> FnCancel<F>
where
    F: Fn() -> bool,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Cancellation for FnCancel<F>
where
    F: Fn() -> bool,
{
    #[inline]
    fn is_cancelled(&self) -> bool {
        (self.f)()
    }
}

/// How a sampling run ended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunStatus {
    /// Every requested tile ran until its active set was empty.
    #[default]
    Completed,
    /// A cancellation checkpoint fired; the result holds the samples accepted before it.
    Cancelled,
}

impl RunStatus {
    pub fn is_cancelled(self) -> bool {
        matches!(self, RunStatus::Cancelled)
    }
}
