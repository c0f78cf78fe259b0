//! Per-operation-class admission control
//!
//! Three independent counting semaphores bound how many uploads,
//! downloads and listings execute at once. A slot is held by an
//! `AdmissionPermit` and returned when the permit drops, so every exit
//! path (error, panic, cancelled future) releases it exactly once.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::context::{CallContext, Interrupted};

/// Operation class. Each class has its own counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    Create,
    Read,
    List,
}

impl OperationClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::List => "list",
        }
    }
}

impl fmt::Display for OperationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capacities per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionLimits {
    pub create: usize,
    pub read: usize,
    pub list: usize,
}

impl AdmissionLimits {
    /// Deployment capacities: 10 uploads, 10 downloads, 100 listings.
    pub const DEFAULT: Self = Self {
        create: 10,
        read: 10,
        list: 100,
    };

    pub fn capacity(&self, class: OperationClass) -> usize {
        match class {
            OperationClass::Create => self.create,
            OperationClass::Read => self.read,
            OperationClass::List => self.list,
        }
    }
}

impl Default for AdmissionLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Bounded-concurrency gate shared by all requests of the process.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    limits: AdmissionLimits,
    create: Arc<Semaphore>,
    read: Arc<Semaphore>,
    list: Arc<Semaphore>,
}

impl AdmissionController {
    pub fn new(limits: AdmissionLimits) -> Self {
        Self {
            limits,
            create: Arc::new(Semaphore::new(limits.create)),
            read: Arc::new(Semaphore::new(limits.read)),
            list: Arc::new(Semaphore::new(limits.list)),
        }
    }

    fn semaphore(&self, class: OperationClass) -> &Arc<Semaphore> {
        match class {
            OperationClass::Create => &self.create,
            OperationClass::Read => &self.read,
            OperationClass::List => &self.list,
        }
    }

    /// Wait for a free slot in `class`.
    ///
    /// Completes early when the caller's token is cancelled or its deadline
    /// passes; a waiter that gives up never holds a slot.
    pub async fn acquire(
        &self,
        class: OperationClass,
        ctx: &CallContext,
    ) -> Result<AdmissionPermit, Interrupted> {
        let semaphore = Arc::clone(self.semaphore(class));
        let permit = ctx
            .run(semaphore.acquire_owned())
            .await?
            .expect("admission semaphores are never closed");

        tracing::trace!(class = %class, available = self.available(class), "admitted");
        Ok(AdmissionPermit {
            class,
            _permit: permit,
        })
    }

    /// Take a slot only if one is free right now.
    pub fn try_acquire(&self, class: OperationClass) -> Option<AdmissionPermit> {
        let semaphore = Arc::clone(self.semaphore(class));
        semaphore.try_acquire_owned().ok().map(|permit| AdmissionPermit {
            class,
            _permit: permit,
        })
    }

    /// Free slots in `class`.
    pub fn available(&self, class: OperationClass) -> usize {
        self.semaphore(class).available_permits()
    }

    /// Slots of `class` currently held.
    pub fn in_flight(&self, class: OperationClass) -> usize {
        self.limits.capacity(class) - self.available(class)
    }
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(AdmissionLimits::DEFAULT)
    }
}

/// A reserved slot. Dropping it releases the slot.
#[must_use = "the slot is released as soon as the permit is dropped"]
#[derive(Debug)]
pub struct AdmissionPermit {
    class: OperationClass,
    _permit: OwnedSemaphorePermit,
}

impl AdmissionPermit {
    pub fn class(&self) -> OperationClass {
        self.class
    }
}
