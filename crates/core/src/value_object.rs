//! Values without identity.

/// Marker for types compared purely by their contents.
///
/// A `Price` of 1250 cents is the same price wherever it appears, while two
/// articles with identical fields are still two different articles.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
