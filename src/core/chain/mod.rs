//! # Chain Module
//!
//! Fuses filter and transform stages into a single per-element function.
//!
//! ## How It Works
//! Each stage wraps the chain built so far in an adapter, the same way
//! `Iterator::filter` and `Iterator::map` wrap an iterator:
//! - `Identity` passes every element through unchanged
//! - `Filtered` runs the inner chain, then keeps the value only if the
//!   predicate accepts it
//! - `Mapped` runs the inner chain, then transforms the value into a
//!   possibly different type
//!
//! No stage list exists at runtime. The executors see one concrete type and
//! the compiler inlines the whole chain into the collection loop.
//!
//! ## Stage Requirements
//! Filters are `Fn(&T) -> bool`, transforms are `Fn(T) -> U`. Both are
//! checked when the stage is added, not when the pipeline runs. Parallel
//! collection additionally requires the chain to be `Sync`.

mod traits;

pub use traits::Chain;

/// The empty chain: every element passes unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T> Chain<T> for Identity {
    type Output = T;

    #[inline]
    fn apply(&self, input: T) -> Option<T> {
        Some(input)
    }
}

/// A chain followed by a filter stage.
#[derive(Clone)]
pub struct Filtered<C, P> {
    inner: C,
    predicate: P,
}

impl<In, C, P> Chain<In> for Filtered<C, P>
where
    C: Chain<In>,
    P: Fn(&C::Output) -> bool,
{
    type Output = C::Output;

    #[inline]
    fn apply(&self, input: In) -> Option<Self::Output> {
        self.inner.apply(input).filter(|value| (self.predicate)(value))
    }
}

/// A chain followed by a transform stage.
#[derive(Clone)]
pub struct Mapped<C, F> {
    inner: C,
    mapping: F,
}

impl<In, C, F, U> Chain<In> for Mapped<C, F>
where
    C: Chain<In>,
    F: Fn(C::Output) -> U,
{
    type Output = U;

    #[inline]
    fn apply(&self, input: In) -> Option<U> {
        self.inner.apply(input).map(&self.mapping)
    }
}

/// Extend `chain` with a filter stage.
pub fn compose_filter<C, P>(chain: C, predicate: P) -> Filtered<C, P> {
    Filtered {
        inner: chain,
        predicate,
    }
}

/// Extend `chain` with a transform stage.
pub fn compose_transform<C, F>(chain: C, mapping: F) -> Mapped<C, F> {
    Mapped {
        inner: chain,
        mapping,
    }
}
