//! Site execution context.
//!
//! Multisite runtimes keep a process-wide "current site" that decides which
//! site's tables are queried. Switching is stack-based: every switch must be
//! paired with a restore. [`SiteScope`] pairs them for the caller.

use tracing::debug;

use crate::errors::StoreError;
use crate::types::SiteId;

/// Switchable "current site" of the native runtime.
pub trait SiteContext: Send + Sync {
    /// The site currently in effect.
    fn current_site(&self) -> SiteId;

    /// Push `site_id` as the current site.
    fn switch_to(&self, site_id: SiteId) -> Result<(), StoreError>;

    /// Pop the last switch, making the previous site current again.
    fn restore(&self);
}

/// Guard that holds a site context for its lifetime.
///
/// The previous site is restored when the guard is dropped, on every exit
/// path including `?` returns and unwinding.
#[must_use = "the site context is restored as soon as the scope is dropped"]
pub struct SiteScope<'a> {
    context: &'a dyn SiteContext,
    site_id: SiteId,
    previous: SiteId,
}

impl<'a> SiteScope<'a> {
    /// Switch into `site_id`.
    pub fn enter(context: &'a dyn SiteContext, site_id: SiteId) -> Result<Self, StoreError> {
        let previous = context.current_site();
        context.switch_to(site_id)?;
        debug!(site_id, previous, "Entered site context");
        Ok(Self {
            context,
            site_id,
            previous,
        })
    }

    pub fn site_id(&self) -> SiteId {
        self.site_id
    }
}

impl Drop for SiteScope<'_> {
    fn drop(&mut self) {
        self.context.restore();
        debug!(
            site_id = self.site_id,
            restored = self.previous,
            "Restored site context"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StackContext {
        stack: Mutex<Vec<SiteId>>,
        reject: Option<SiteId>,
    }

    impl StackContext {
        fn new() -> Self {
            Self {
                stack: Mutex::new(vec![1]),
                reject: None,
            }
        }
    }

    impl SiteContext for StackContext {
        fn current_site(&self) -> SiteId {
            *self.stack.lock().unwrap().last().unwrap()
        }

        fn switch_to(&self, site_id: SiteId) -> Result<(), StoreError> {
            if self.reject == Some(site_id) {
                return Err(StoreError::site_context("rejected"));
            }
            self.stack.lock().unwrap().push(site_id);
            Ok(())
        }

        fn restore(&self) {
            let mut stack = self.stack.lock().unwrap();
            if stack.len() > 1 {
                stack.pop();
            }
        }
    }

    fn fails_inside(context: &StackContext) -> Result<(), StoreError> {
        let _scope = SiteScope::enter(context, 9)?;
        assert_eq!(context.current_site(), 9);
        Err(StoreError::metadata("boom"))
    }

    #[test]
    fn test_scope_restores_on_drop() {
        let context = StackContext::new();
        {
            let scope = SiteScope::enter(&context, 7).unwrap();
            assert_eq!(scope.site_id(), 7);
            assert_eq!(context.current_site(), 7);
            {
                let _inner = SiteScope::enter(&context, 8).unwrap();
                assert_eq!(context.current_site(), 8);
            }
            assert_eq!(context.current_site(), 7);
        }
        assert_eq!(context.current_site(), 1);
    }

    #[test]
    fn test_scope_restores_on_error_path() {
        let context = StackContext::new();
        assert!(fails_inside(&context).is_err());
        assert_eq!(context.current_site(), 1);
    }

    #[test]
    fn test_failed_switch_does_not_restore() {
        let mut context = StackContext::new();
        context.reject = Some(3);
        context.stack.lock().unwrap().push(2);

        assert!(SiteScope::enter(&context, 3).is_err());
        assert_eq!(context.current_site(), 2);
    }
}
