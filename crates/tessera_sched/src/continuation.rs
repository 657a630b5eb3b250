//! Synchronous single-threaded continuations.
//!
//! A [`Continuation`] is either resolved with a value or pending with a list
//! of waiters. Registering a waiter on a resolved continuation runs it
//! immediately; resolving a pending continuation runs its waiters in
//! registration order. Waiters receive a shared context, so resolution can
//! cascade through other continuations without any scheduling.

use crate::error::ContinuationError;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Waiter<C, T> = Box<dyn FnOnce(&mut C, T)>;

enum State<C, T> {
    Ready(T),
    Pending(Vec<Waiter<C, T>>),
}

/// A value of type `T` that may not have been produced yet
///
/// Clones share their state.
pub struct Continuation<C, T> {
    state: Rc<RefCell<State<C, T>>>,
}

impl<C: 'static, T: Clone + 'static> Continuation<C, T> {
    /// A continuation resolved with `value`
    #[must_use]
    pub fn ready(value: T) -> Self {
        Self {
            state: Rc::new(RefCell::new(State::Ready(value))),
        }
    }

    /// A pending continuation without waiters
    #[must_use]
    pub fn pending() -> Self {
        Self {
            state: Rc::new(RefCell::new(State::Pending(Vec::new()))),
        }
    }

    /// Check if the value has been produced
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(*self.state.borrow(), State::Ready(_))
    }

    /// The value, if produced
    #[must_use]
    pub fn value(&self) -> Option<T> {
        match &*self.state.borrow() {
            State::Ready(value) => Some(value.clone()),
            State::Pending(_) => None,
        }
    }

    /// Number of waiters registered on a pending continuation
    #[must_use]
    pub fn waiter_count(&self) -> usize {
        match &*self.state.borrow() {
            State::Ready(_) => 0,
            State::Pending(waiters) => waiters.len(),
        }
    }

    /// Run `waiter` once the value exists; immediately if it already does
    pub fn on_ready<F>(&self, ctx: &mut C, waiter: F)
    where
        F: FnOnce(&mut C, T) + 'static,
    {
        let value = {
            let mut state = self.state.borrow_mut();
            match &mut *state {
                State::Ready(value) => value.clone(),
                State::Pending(waiters) => {
                    waiters.push(Box::new(waiter));
                    return;
                }
            }
        };
        waiter(ctx, value);
    }

    /// Resolve a pending continuation and run its waiters in registration order
    ///
    /// # Errors
    ///
    /// Returns [`ContinuationError::AlreadyResolved`] if the value was
    /// produced before
    pub fn accept(&self, ctx: &mut C, value: T) -> Result<(), ContinuationError> {
        if self.is_ready() {
            return Err(ContinuationError::AlreadyResolved);
        }
        self.settle(ctx, value);
        Ok(())
    }

    /// Resolve if still pending
    fn settle(&self, ctx: &mut C, value: T) {
        let waiters = {
            let mut state = self.state.borrow_mut();
            match std::mem::replace(&mut *state, State::Ready(value.clone())) {
                State::Pending(waiters) => waiters,
                previous @ State::Ready(_) => {
                    *state = previous;
                    return;
                }
            }
        };
        for waiter in waiters {
            waiter(ctx, value.clone());
        }
    }

    /// A continuation resolved with `f` applied to this value
    pub fn map<U, F>(&self, ctx: &mut C, f: F) -> Continuation<C, U>
    where
        U: Clone + 'static,
        F: FnOnce(&mut C, T) -> U + 'static,
    {
        let out = Continuation::pending();
        let target = out.clone();
        self.on_ready(ctx, move |ctx, value| {
            let mapped = f(ctx, value);
            target.settle(ctx, mapped);
        });
        out
    }

    /// A continuation resolved with the continuation `f` produces from this value
    pub fn and_then<U, F>(&self, ctx: &mut C, f: F) -> Continuation<C, U>
    where
        U: Clone + 'static,
        F: FnOnce(&mut C, T) -> Continuation<C, U> + 'static,
    {
        let out = Continuation::pending();
        let target = out.clone();
        self.on_ready(ctx, move |ctx, value| {
            let inner = f(ctx, value);
            inner.on_ready(ctx, move |ctx, produced| target.settle(ctx, produced));
        });
        out
    }

    /// A continuation resolved once both this and `other` are
    pub fn join<U>(&self, ctx: &mut C, other: &Continuation<C, U>) -> Continuation<C, (T, U)>
    where
        U: Clone + 'static,
    {
        let other = other.clone();
        self.and_then(ctx, move |ctx, first| {
            other.map(ctx, move |_, second| (first, second))
        })
    }

    /// A continuation resolved once every item is, with the values in item order
    pub fn join_all(ctx: &mut C, items: &[Continuation<C, T>]) -> Continuation<C, Vec<T>> {
        let mut acc = Continuation::ready(Vec::with_capacity(items.len()));
        for item in items {
            acc = acc
                .join(ctx, item)
                .map(ctx, |_, (mut values, value)| {
                    values.push(value);
                    values
                });
        }
        acc
    }
}

impl<C, T> Clone for Continuation<C, T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<C, T: fmt::Debug> fmt::Debug for Continuation<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.borrow() {
            State::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            State::Pending(waiters) => f
                .debug_struct("Pending")
                .field("waiters", &waiters.len())
                .finish(),
        }
    }
}
