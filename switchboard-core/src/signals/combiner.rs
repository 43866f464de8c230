//! Result aggregation policies.
//!
//! When a signal's slots return values, one emission produces an ordered
//! sequence of results. A [`Combiner`] reduces that sequence to the value
//! returned by `emit`. The policy is a type parameter of the signal, fixed at
//! construction, so swapping it never touches the emission loop.

/// Reduces the per-slot results of one emission to a single value.
pub trait Combiner<R> {
    /// The value `emit` returns.
    type Output;

    /// Combine results, given in the order the slots were invoked.
    fn combine<I>(&self, results: I) -> Self::Output
    where
        I: IntoIterator<Item = R>;
}

/// Keep only the last slot's result; `None` if no slot ran.
///
/// This is the default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalLastValue;

impl<R> Combiner<R> for OptionalLastValue {
    type Output = Option<R>;

    fn combine<I>(&self, results: I) -> Option<R>
    where
        I: IntoIterator<Item = R>,
    {
        results.into_iter().last()
    }
}

/// Keep every result, in invocation order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectAll;

impl<R> Combiner<R> for CollectAll {
    type Output = Vec<R>;

    fn combine<I>(&self, results: I) -> Vec<R>
    where
        I: IntoIterator<Item = R>,
    {
        results.into_iter().collect()
    }
}

/// Produce nothing. Used by void signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl<R> Combiner<R> for Discard {
    type Output = ();

    fn combine<I>(&self, results: I)
    where
        I: IntoIterator<Item = R>,
    {
        results.into_iter().for_each(drop);
    }
}

/// Left fold over the results, starting from a fresh copy of `init` on every
/// emission.
///
/// ```rust,ignore
/// // Sum the values reported by every slot.
/// let total: Signal<(), u32, _> = Signal::with_combiner(Fold::new(0, |acc, v| acc + v));
/// ```
#[derive(Debug, Clone)]
pub struct Fold<T, F> {
    init: T,
    fold: F,
}

impl<T, F> Fold<T, F> {
    /// Create a fold policy.
    pub fn new(init: T, fold: F) -> Self {
        Self { init, fold }
    }
}

impl<R, T, F> Combiner<R> for Fold<T, F>
where
    T: Clone,
    F: Fn(T, R) -> T,
{
    type Output = T;

    fn combine<I>(&self, results: I) -> T
    where
        I: IntoIterator<Item = R>,
    {
        results.into_iter().fold(self.init.clone(), &self.fold)
    }
}
