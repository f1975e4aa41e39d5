//! Ambient tenant domain.

use std::cell::RefCell;
use std::marker::PhantomData;

/// Supplies the tenant domain registry calls are scoped to.
pub trait TenantProvider: Send + Sync {
    /// The current domain, or `None` for the shared domain.
    fn current_domain(&self) -> Option<String>;
}

/// Always the shared domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleTenant;

impl TenantProvider for SingleTenant {
    fn current_domain(&self) -> Option<String> {
        None
    }
}

thread_local! {
    static CURRENT_DOMAIN: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Reads the domain from a thread-local set with [`ThreadTenant::enter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadTenant;

impl ThreadTenant {
    /// Run the current thread as `domain` until the guard is dropped.
    pub fn enter(domain: impl Into<String>) -> TenantGuard {
        let previous = CURRENT_DOMAIN.with(|current| current.replace(Some(domain.into())));
        TenantGuard {
            previous,
            _not_send: PhantomData,
        }
    }
}

impl TenantProvider for ThreadTenant {
    fn current_domain(&self) -> Option<String> {
        CURRENT_DOMAIN.with(|current| current.borrow().clone())
    }
}

/// Restores the previous thread domain on drop.
#[must_use = "the domain is reset as soon as the guard is dropped"]
pub struct TenantGuard {
    previous: Option<String>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for TenantGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_DOMAIN.with(|current| *current.borrow_mut() = previous);
    }
}
