//! Values compared by content.

/// Marker for immutable values without identity (currency codes, business errors).
///
/// Two instances with equal content are interchangeable; a different value is a
/// new instance, never a mutation.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
