/// Trailing-edge debouncer for rapidly changing input (search boxes, save requests)
///
/// Each `call` reschedules the callback `delay` after the latest call, so a burst
/// of calls produces exactly one invocation with the arguments of the last one.
///
/// Every scheduled invocation runs under a child of the debouncer's disposal
/// token. Once the owner is torn down (`dispose`, or the owner's token being
/// disposed) nothing scheduled earlier will run and new calls are ignored.
///
/// # Example
/// ```ignore
/// let search = Debouncer::new(Duration::from_millis(300), move |query: String| {
///     apply_filter(&query);
/// });
///
/// search.call("p".into());   // scheduled
/// search.call("pa".into());  // previous cancelled, rescheduled
/// search.call("par".into()); // previous cancelled, rescheduled
/// // apply_filter("par") runs once, 300ms after the last keystroke
/// ```

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::runtime::{sleep, spawn_local, DisposalToken};

/// Arguments waiting for their timer, shared with the scheduled task
type Slot<A> = Rc<RefCell<Option<A>>>;

struct Scheduled<A> {
    slot: Slot<A>,
    token: DisposalToken,
}

pub struct Debouncer<A: 'static> {
    pending: Rc<RefCell<Option<Scheduled<A>>>>,
    callback: Rc<dyn Fn(A)>,
    delay: Duration,
    owner: DisposalToken,
}

impl<A: 'static> Debouncer<A> {
    /// Create a debouncer with its own disposal token
    pub fn new<F>(delay: Duration, callback: F) -> Self
    where
        F: Fn(A) + 'static,
    {
        Self::with_owner(delay, &DisposalToken::new(), callback)
    }

    /// Create a debouncer that is disposed together with `owner`
    pub fn with_owner<F>(delay: Duration, owner: &DisposalToken, callback: F) -> Self
    where
        F: Fn(A) + 'static,
    {
        Self {
            pending: Rc::new(RefCell::new(None)),
            callback: Rc::new(callback),
            delay,
            owner: owner.child(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule the callback with `args`, cancelling any pending invocation
    ///
    /// # Panics
    /// On native builds the timer is a local task, so this must run inside a
    /// `tokio::task::LocalSet`; see [`spawn_local`].
    pub fn call(&self, args: A) {
        if self.owner.is_disposed() {
            log::debug!("Ignoring debounced call after disposal");
            return;
        }

        let slot: Slot<A> = Rc::new(RefCell::new(Some(args)));
        let token = self.owner.child();

        let previous = self.pending.borrow_mut().replace(Scheduled {
            slot: Rc::clone(&slot),
            token: token.clone(),
        });
        if let Some(previous) = previous {
            previous.token.dispose();
        }

        let pending = Rc::clone(&self.pending);
        let callback = Rc::clone(&self.callback);
        let delay = self.delay;

        spawn_local(async move {
            tokio::select! {
                biased;
                _ = token.disposed() => return,
                _ = sleep(delay) => {}
            }
            if token.is_disposed() {
                return;
            }

            {
                let mut pending = pending.borrow_mut();
                let still_ours = pending
                    .as_ref()
                    .map(|scheduled| Rc::ptr_eq(&scheduled.slot, &slot))
                    .unwrap_or(false);
                if still_ours {
                    *pending = None;
                }
            }

            let args = slot.borrow_mut().take();
            if let Some(args) = args {
                callback(args);
            }
        });
    }

    /// Drop the pending invocation, if any
    pub fn cancel(&self) {
        let previous = self.pending.borrow_mut().take();
        if let Some(previous) = previous {
            previous.token.dispose();
        }
    }

    /// Run the pending invocation now instead of waiting for the timer.
    /// Returns false when nothing was pending.
    pub fn flush(&self) -> bool {
        let previous = self.pending.borrow_mut().take();
        let Some(previous) = previous else {
            return false;
        };
        previous.token.dispose();

        if self.owner.is_disposed() {
            return false;
        }

        let args = previous.slot.borrow_mut().take();
        match args {
            Some(args) => {
                (self.callback)(args);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    /// Tear down: cancel the pending invocation and ignore every later call
    pub fn dispose(&self) {
        self.owner.dispose();
        self.pending.borrow_mut().take();
    }

    pub fn is_disposed(&self) -> bool {
        self.owner.is_disposed()
    }
}

impl<A: 'static> Clone for Debouncer<A> {
    fn clone(&self) -> Self {
        Self {
            pending: Rc::clone(&self.pending),
            callback: Rc::clone(&self.callback),
            delay: self.delay,
            owner: self.owner.clone(),
        }
    }
}

/// Helper function to create a debounced closure
///
/// # Example
/// ```ignore
/// let debounced_save = create_debounced(Duration::from_secs(1), || save_to_storage());
///
/// debounced_save(); // Scheduled
/// debounced_save(); // Previous cancelled, new scheduled
/// // Only one save happens, one second after the last call
/// ```
pub fn create_debounced<F>(delay: Duration, callback: F) -> impl Fn()
where
    F: Fn() + 'static,
{
    let debouncer = Debouncer::new(delay, move |()| callback());
    move || debouncer.call(())
}
