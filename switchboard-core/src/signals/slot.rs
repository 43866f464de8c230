//! Slot abstraction.
//!
//! A signal is parameterized over a tuple of argument types. Any closure or
//! function taking those arguments individually is a valid slot, so
//! `Signal<(i32, String)>` accepts `|n: i32, s: String| ...`.
//!
//! Closures passed through the [`Slot`] bound need their parameter types
//! annotated; the compiler cannot infer them through the blanket impls.

/// A callable that can be registered with a signal.
pub trait Slot<Args, R>: Send + Sync + 'static {
    /// Invoke the slot with one emission's arguments.
    fn call(&self, args: Args) -> R;
}

macro_rules! impl_slot {
    ($($arg:ident),*) => {
        impl<Func, R, $($arg,)*> Slot<($($arg,)*), R> for Func
        where
            Func: Fn($($arg),*) -> R + Send + Sync + 'static,
        {
            #[allow(non_snake_case, clippy::unused_unit)]
            fn call(&self, ($($arg,)*): ($($arg,)*)) -> R {
                (self)($($arg),*)
            }
        }
    };
}

impl_slot!();
impl_slot!(A1);
impl_slot!(A1, A2);
impl_slot!(A1, A2, A3);
impl_slot!(A1, A2, A3, A4);
impl_slot!(A1, A2, A3, A4, A5);
impl_slot!(A1, A2, A3, A4, A5, A6);
impl_slot!(A1, A2, A3, A4, A5, A6, A7);
impl_slot!(A1, A2, A3, A4, A5, A6, A7, A8);
