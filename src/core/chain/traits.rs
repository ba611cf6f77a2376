//! Trait definition for fused operation chains.

/// A fused sequence of filter and transform stages.
///
/// Applying a chain to one input element yields exactly one output value or
/// nothing. Implementations must stop at the first stage that rejects the
/// element; later stages are never invoked for it.
///
/// The output type is an associated type, so every `transform` rebinds it at
/// compile time and the executors monomorphize over the whole chain.
pub trait Chain<In> {
    /// Element type produced by the last stage
    type Output;

    /// Run every stage on `input`, returning `None` if any filter rejects it
    fn apply(&self, input: In) -> Option<Self::Output>;
}

impl<In, C> Chain<In> for &C
where
    C: Chain<In> + ?Sized,
{
    type Output = C::Output;

    #[inline]
    fn apply(&self, input: In) -> Option<Self::Output> {
        (**self).apply(input)
    }
}
