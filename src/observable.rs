//! Observable values on top of spark-signals.
//!
//! An [`Observable`] is a shared handle to a value that notifies subscribers
//! whenever it is written. Every notification carries a [`Change`] telling
//! whether the value actually changed.
//!
//! Writable observables are `spark_signals` signals built with
//! `never_equals`, so every write notifies, equal or not. Derived observables
//! ([`Observable::map`], [`merge2`], [`merge3`], [`Observable::length`],
//! [`Observable::item`]) are `spark_signals` deriveds. A subscription is a
//! sync effect that reads the source and hands the value to the observer
//! untracked.
//!
//! Writes made from inside an observer are delivered once that observer
//! returns, before the outermost write returns.
//!
//! # Example
//!
//! ```ignore
//! use domic::observable::{Observable, ObserveOptions};
//!
//! let names = Observable::new(vec!["ada".to_string()]);
//! let count = names.length();
//!
//! let stop = count.subscribe(|n, change| {
//!     if change.value_changed() {
//!         println!("{n} names");
//!     }
//! }, ObserveOptions::default());
//!
//! names.update(|v| v.push("grace".into())); // prints "2 names"
//! stop();
//! ```

use std::cell::Cell;
use std::rc::Rc;

use spark_signals::{
    derived_with_equals, effect_root, effect_sync, never_equals, signal_with_equals, untrack,
    with_context, Derived, Signal,
};

use crate::types::Unsubscribe;

// =============================================================================
// Change Descriptor & Options
// =============================================================================

/// Describes a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    initial: bool,
    value_changed: bool,
}

impl Change {
    /// The call made right after subscribing.
    pub fn initial() -> Self {
        Self {
            initial: true,
            value_changed: true,
        }
    }

    /// A notification caused by a write.
    pub fn update(value_changed: bool) -> Self {
        Self {
            initial: false,
            value_changed,
        }
    }

    pub fn is_initial(&self) -> bool {
        self.initial
    }

    /// False when the write stored a value equal to the previous one.
    pub fn value_changed(&self) -> bool {
        self.value_changed
    }
}

/// Subscription options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    /// Skip the immediate call made on subscription.
    pub updates_only: bool,
}

impl ObserveOptions {
    pub fn updates_only() -> Self {
        Self { updates_only: true }
    }
}

// =============================================================================
// Sources
// =============================================================================

enum Source<T: Clone + 'static> {
    Signal(Signal<T>),
    Derived {
        value: Derived<T>,
        write: Option<Rc<dyn Fn(T)>>,
    },
}

impl<T: Clone + 'static> Clone for Source<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Signal(signal) => Self::Signal(signal.clone()),
            Self::Derived { value, write } => Self::Derived {
                value: value.clone(),
                write: write.clone(),
            },
        }
    }
}

/// Run `f` with dependency tracking on.
///
/// spark-signals keeps its untracking flag set inside effects and deriveds
/// created under `untrack`, which is where observers run.
fn tracked<R>(f: impl FnOnce() -> R) -> R {
    let previous = with_context(|ctx| ctx.set_untracking(false));
    let result = f();
    with_context(|ctx| ctx.set_untracking(previous));
    result
}

struct Subscription {
    active: Cell<bool>,
    notifying: Cell<bool>,
}

// =============================================================================
// Observable
// =============================================================================

/// Shared handle to an observable value. Cloning shares the value.
pub struct Observable<T: Clone + PartialEq + 'static> {
    source: Source<T>,
}

impl<T: Clone + PartialEq + 'static> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// A writable observable holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            source: Source::Signal(signal_with_equals(value, never_equals::<T>)),
        }
    }

    /// A read-only observable that always holds `value`.
    pub fn constant(value: T) -> Self {
        Self::computed(move || value.clone(), None)
    }

    fn computed(compute: impl Fn() -> T + 'static, write: Option<Rc<dyn Fn(T)>>) -> Self {
        Self {
            source: Source::Derived {
                value: derived_with_equals(move || tracked(&compute), never_equals::<T>),
                write,
            },
        }
    }

    pub fn get(&self) -> T {
        match &self.source {
            Source::Signal(signal) => signal.get(),
            Source::Derived { value, .. } => value.get(),
        }
    }

    /// Store `value` and notify every subscriber, even if the value is equal.
    pub fn set(&self, value: T) {
        match &self.source {
            Source::Signal(signal) => {
                signal.set(value);
            }
            Source::Derived { write: Some(write), .. } => write(value),
            Source::Derived { write: None, .. } => {
                tracing::warn!(target: "domic", "write to a read-only observable ignored");
            }
        }
    }

    /// Modify the value in place and notify.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut value = untrack(|| self.get());
        f(&mut value);
        self.set(value);
    }

    /// Register `observer`. Unless `options.updates_only`, it is called once
    /// right away with [`Change::initial`].
    ///
    /// The subscription lives until the returned closure is called or
    /// dropped.
    pub fn subscribe(
        &self,
        observer: impl Fn(&T, Change) + 'static,
        options: ObserveOptions,
    ) -> Unsubscribe {
        let state = Rc::new(Subscription {
            active: Cell::new(true),
            notifying: Cell::new(false),
        });

        let source = self.clone();
        let s = state.clone();
        // Rooted so the effect survives re-runs of an enclosing effect
        let dispose = effect_root(move || {
            let mut last: Option<T> = None;
            let _effect = effect_sync(move || {
                let value = tracked(|| source.get());
                let change = match last.replace(value.clone()) {
                    None => Change::initial(),
                    Some(previous) => Change::update(previous != value),
                };
                if (change.is_initial() && options.updates_only) || !s.active.get() {
                    return;
                }
                s.notifying.set(true);
                untrack(|| observer(&value, change));
                s.notifying.set(false);
            });
        });

        Box::new(move || {
            state.active.set(false);
            // A subscription stopped by its own observer is released on drop
            if !state.notifying.get() {
                dispose();
            }
        })
    }

    /// The backing signal of a writable observable, `None` for derived ones.
    pub fn signal(&self) -> Option<Signal<T>> {
        match &self.source {
            Source::Signal(signal) => Some(signal.clone()),
            Source::Derived { .. } => None,
        }
    }

    pub fn is_writable(&self) -> bool {
        match &self.source {
            Source::Signal(_) => true,
            Source::Derived { write, .. } => write.is_some(),
        }
    }

    /// Read-only view computed from this observable.
    pub fn map<U, F>(&self, f: F) -> Observable<U>
    where
        U: Clone + PartialEq + 'static,
        F: Fn(&T) -> U + 'static,
    {
        let source = self.clone();
        Observable::computed(move || f(&source.get()), None)
    }
}

impl<T: Clone + PartialEq + 'static> Observable<Vec<T>> {
    /// Length of the sequence.
    pub fn length(&self) -> Observable<usize> {
        self.map(Vec::len)
    }

    /// Element at `index`, `None` once the sequence is shorter.
    ///
    /// Writing `Some(value)` replaces the element when it exists.
    pub fn item(&self, index: usize) -> Observable<Option<T>> {
        let read = self.clone();
        let write = self.clone();
        Observable::computed(
            move || read.get().get(index).cloned(),
            Some(Rc::new(move |value: Option<T>| {
                let Some(value) = value else { return };
                if index < untrack(|| write.get().len()) {
                    write.update(|list| list[index] = value);
                }
            })),
        )
    }
}

/// Combine two observables into one tuple observable.
pub fn merge2<A, B>(a: &Observable<A>, b: &Observable<B>) -> Observable<(A, B)>
where
    A: Clone + PartialEq + 'static,
    B: Clone + PartialEq + 'static,
{
    let (a, b) = (a.clone(), b.clone());
    Observable::computed(move || (a.get(), b.get()), None)
}

/// Combine three observables into one tuple observable.
pub fn merge3<A, B, C>(
    a: &Observable<A>,
    b: &Observable<B>,
    c: &Observable<C>,
) -> Observable<(A, B, C)>
where
    A: Clone + PartialEq + 'static,
    B: Clone + PartialEq + 'static,
    C: Clone + PartialEq + 'static,
{
    let (a, b, c) = (a.clone(), b.clone(), c.clone());
    Observable::computed(move || (a.get(), b.get(), c.get()), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<(T, Change)>>>, impl Fn(&T, Change) + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        (log, move |value: &T, change| sink.borrow_mut().push((value.clone(), change)))
    }

    #[test]
    fn test_subscribe_calls_immediately() {
        let obs = Observable::new(1);
        let (log, observer) = recorder::<i32>();
        let _stop = obs.subscribe(observer, ObserveOptions::default());

        assert_eq!(*log.borrow(), vec![(1, Change::initial())]);
    }

    #[test]
    fn test_updates_only_skips_initial_call() {
        let obs = Observable::new(1);
        let (log, observer) = recorder::<i32>();
        let _stop = obs.subscribe(observer, ObserveOptions::updates_only());

        assert!(log.borrow().is_empty());
        obs.set(2);
        assert_eq!(*log.borrow(), vec![(2, Change::update(true))]);
    }

    #[test]
    fn test_change_descriptor_reports_equal_writes() {
        let obs = Observable::new("a".to_string());
        let (log, observer) = recorder::<String>();
        let _stop = obs.subscribe(observer, ObserveOptions::updates_only());

        obs.set("a".to_string());
        obs.set("b".to_string());
        let changes: Vec<bool> = log.borrow().iter().map(|(_, c)| c.value_changed()).collect();
        assert_eq!(changes, vec![false, true]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let obs = Observable::new(0);
        let (log, observer) = recorder::<i32>();
        let stop = obs.subscribe(observer, ObserveOptions::updates_only());

        obs.set(1);
        stop();
        obs.set(2);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_unsubscribe_during_notification() {
        let obs = Observable::new(0);
        let second: Rc<RefCell<Option<Unsubscribe>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let s = second.clone();
        let _first = obs.subscribe(
            move |_, _| {
                if let Some(stop) = s.borrow_mut().take() {
                    stop();
                }
            },
            ObserveOptions::updates_only(),
        );
        let c = calls.clone();
        *second.borrow_mut() = Some(obs.subscribe(move |_, _| c.set(c.get() + 1), ObserveOptions::updates_only()));

        obs.set(1);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_reentrant_set() {
        let obs = Observable::new(0);
        let echo = obs.clone();
        let _stop = obs.subscribe(
            move |v, _| {
                if *v == 1 {
                    echo.set(2);
                }
            },
            ObserveOptions::updates_only(),
        );

        obs.set(1);
        assert_eq!(obs.get(), 2);
    }

    #[test]
    fn test_map_tracks_source() {
        let obs = Observable::new(2);
        let doubled = obs.map(|v| v * 2);
        let (log, observer) = recorder::<i32>();
        let _stop = doubled.subscribe(observer, ObserveOptions::default());

        obs.set(5);
        assert_eq!(doubled.get(), 10);
        assert_eq!(
            *log.borrow(),
            vec![(4, Change::initial()), (10, Change::update(true))]
        );
        assert!(!doubled.is_writable());
    }

    #[test]
    fn test_length_only_changes_when_length_does() {
        let list = Observable::new(vec![1, 2, 3]);
        let (log, observer) = recorder::<usize>();
        let _stop = list.length().subscribe(observer, ObserveOptions::updates_only());

        list.set(vec![3, 2, 1]);
        list.update(|l| l.push(4));
        let seen: Vec<(usize, bool)> = log.borrow().iter().map(|(n, c)| (*n, c.value_changed())).collect();
        assert_eq!(seen, vec![(3, false), (4, true)]);
    }

    #[test]
    fn test_item_reads_and_writes_back() {
        let list = Observable::new(vec!["a", "b"]);
        let second = list.item(1);
        assert_eq!(second.get(), Some("b"));

        second.set(Some("z"));
        assert_eq!(list.get(), vec!["a", "z"]);

        list.set(vec!["a"]);
        assert_eq!(second.get(), None);
        second.set(Some("ignored"));
        assert_eq!(list.get(), vec!["a"]);
    }

    #[test]
    fn test_merge3_notifies_on_any_input() {
        let a = Observable::new(1);
        let b = Observable::new("x");
        let c = Observable::new(false);
        let merged = merge3(&a, &b, &c);
        let (log, observer) = recorder::<(i32, &'static str, bool)>();
        let _stop = merged.subscribe(observer, ObserveOptions::updates_only());

        b.set("y");
        c.set(true);
        assert_eq!(merged.get(), (1, "y", true));
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_merge2() {
        let a = Observable::new(1);
        let b = Observable::new(2);
        let sum = merge2(&a, &b).map(|(x, y)| x + y);
        a.set(10);
        assert_eq!(sum.get(), 12);
    }

    #[test]
    fn test_constant_is_read_only() {
        let fixed = Observable::constant(3);
        fixed.set(4);
        assert_eq!(fixed.get(), 3);
        assert!(!fixed.is_writable());
    }

    #[test]
    fn test_subscription_made_inside_observer_keeps_tracking() {
        let outer = Observable::new(0);
        let inner = Observable::new("a".to_string());
        let (log, observer) = recorder::<String>();
        let observer = Rc::new(observer);
        let stops: Rc<RefCell<Vec<Unsubscribe>>> = Rc::new(RefCell::new(Vec::new()));

        let (i, o, st) = (inner.clone(), observer.clone(), stops.clone());
        let _stop = outer.subscribe(
            move |_, change| {
                if change.is_initial() {
                    let o = o.clone();
                    let stop = i.subscribe(move |v, c| o(v, c), ObserveOptions::updates_only());
                    st.borrow_mut().push(stop);
                }
            },
            ObserveOptions::default(),
        );

        outer.set(1);
        inner.set("b".to_string());
        assert_eq!(*log.borrow(), vec![("b".to_string(), Change::update(true))]);
    }

    #[test]
    fn test_observer_can_stop_itself() {
        let obs = Observable::new(0);
        let own: Rc<RefCell<Option<Unsubscribe>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let (c, o) = (calls.clone(), own.clone());
        let stop = obs.subscribe(
            move |_, _| {
                c.set(c.get() + 1);
                if let Some(stop) = o.borrow_mut().take() {
                    stop();
                }
            },
            ObserveOptions::updates_only(),
        );
        *own.borrow_mut() = Some(stop);

        obs.set(1);
        obs.set(2);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_derived_reads_from_spark_effect() {
        let list = Observable::new(vec![1, 2]);
        let count = list.length();
        let seen = Rc::new(Cell::new(0));

        let (c, s) = (count.clone(), seen.clone());
        let _dispose = spark_signals::effect(move || s.set(c.get()));
        list.update(|l| l.push(3));
        assert_eq!(seen.get(), 3);
    }

    #[test]
    fn test_signal_exposes_value() {
        let obs = Observable::new(7);
        let sig = obs.signal().unwrap();
        obs.set(8);
        assert_eq!(sig.get(), 8);
        assert!(obs.map(|v| *v).signal().is_none());
    }
}
