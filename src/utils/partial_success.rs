//! Operations that complete even though some of their parts failed.

/// A successful operation where some parts failed without preventing overall success.
/// The `Vec<E>` holds the errors of the failed parts.
pub type PartialSuccess<T, E> = ( T, Vec<E> );
