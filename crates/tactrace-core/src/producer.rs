//! Single-pass, pull-based sequences used for lazy traces.
//!
//! A [`Producer`] yields `Result<T>` items until it reports the end. It can
//! be iterated exactly once: after it returns `None`, or after it yields an
//! error, every further call returns `None`. Consumers that need several
//! passes must collect it first.
//!
//! Producers are composed from two building blocks:
//!
//! - [`Deferred`]: runs a fallible constructor on the first pull (deep loading
//!   uses it to open and decode a referenced file only when reached);
//! - [`Concat`]: drains a lazily supplied sequence of producers one after the
//!   other, holding at most one of them open at a time.

use std::fmt;
use std::iter::FusedIterator;

use tracing::trace;

use crate::error::Result;

type BoxIter<T> = Box<dyn Iterator<Item = Result<T>> + Send>;

/// Type-erased single-pass sequence of `Result<T>`.
///
/// The underlying iterator is dropped as soon as it ends or fails, which
/// releases any file buffers it holds.
pub struct Producer<T> {
    inner: Option<BoxIter<T>>,
}

impl<T: Send + 'static> Producer<T> {
    /// Wrap any fallible iterator.
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<T>> + Send + 'static,
    {
        Self {
            inner: Some(Box::new(iter)),
        }
    }

    /// Yield the elements of an already materialized vector.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::new(items.into_iter().map(Ok))
    }

    /// Build the real producer on first pull; see [`Deferred`].
    pub fn deferred<F>(make: F) -> Self
    where
        F: FnOnce() -> Result<Self> + Send + 'static,
    {
        Self::new(Deferred::new(make))
    }

    /// Chain producers end to end; see [`Concat`].
    pub fn concat<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = Self>,
        I::IntoIter: Send + 'static,
    {
        Self::new(Concat::new(parts))
    }
}

impl<T> Producer<T> {
    /// A producer that is already at its end.
    #[must_use]
    pub const fn empty() -> Self {
        Self { inner: None }
    }

    /// Whether the producer has ended (or failed). A `false` result does not
    /// guarantee that another item follows.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.inner.is_none()
    }
}

impl<T> Iterator for Producer<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let inner = self.inner.as_mut()?;
        match inner.next() {
            Some(Ok(item)) => Some(Ok(item)),
            Some(Err(e)) => {
                self.inner = None;
                Some(Err(e))
            }
            None => {
                self.inner = None;
                None
            }
        }
    }
}

impl<T> FusedIterator for Producer<T> {}

impl<T> Default for Producer<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Send + 'static> From<Vec<T>> for Producer<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("exhausted", &self.is_exhausted())
            .finish_non_exhaustive()
    }
}

/* ---------------- Deferred ---------------- */

type Make<T> = Box<dyn FnOnce() -> Result<Producer<T>> + Send>;

/// Producer whose contents are built on the first pull.
///
/// If construction fails, the error is the first and only item. Single-pass.
pub enum Deferred<T> {
    /// Not pulled yet.
    Pending(Make<T>),
    /// Constructed and being drained.
    Running(Producer<T>),
    /// Ended or failed.
    Done,
}

impl<T> Deferred<T> {
    /// Defer `make` until the first call to `next`.
    pub fn new<F>(make: F) -> Self
    where
        F: FnOnce() -> Result<Producer<T>> + Send + 'static,
    {
        Self::Pending(Box::new(make))
    }
}

impl<T> Iterator for Deferred<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(self, Self::Done) {
                Self::Pending(make) => match make() {
                    Ok(p) => *self = Self::Running(p),
                    Err(e) => return Some(Err(e)),
                },
                Self::Running(mut p) => {
                    let item = p.next();
                    if item.is_some() {
                        *self = Self::Running(p);
                    }
                    return item;
                }
                Self::Done => return None,
            }
        }
    }
}

impl<T> FusedIterator for Deferred<T> {}

/* ---------------- Concat ---------------- */

/// Concatenation of a lazily supplied sequence of producers.
///
/// Parts are pulled from `rest` only once the current part has ended, so at
/// most one part is open at any time. The first error ends the whole
/// concatenation. Single-pass.
pub struct Concat<T> {
    current: Option<Producer<T>>,
    rest: Option<Box<dyn Iterator<Item = Producer<T>> + Send>>,
}

impl<T> Concat<T> {
    /// Concatenate `parts` in order.
    pub fn new<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = Producer<T>>,
        I::IntoIter: Send + 'static,
    {
        Self {
            current: None,
            rest: Some(Box::new(parts.into_iter())),
        }
    }
}

impl<T> Iterator for Concat<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(cur) = self.current.as_mut() {
                match cur.next() {
                    Some(Ok(item)) => return Some(Ok(item)),
                    Some(Err(e)) => {
                        self.current = None;
                        self.rest = None;
                        return Some(Err(e));
                    }
                    None => self.current = None,
                }
            }
            match self.rest.as_mut().and_then(Iterator::next) {
                Some(part) => self.current = Some(part),
                None => {
                    self.rest = None;
                    return None;
                }
            }
            trace!("concat: advancing to next part");
        }
    }
}

impl<T> FusedIterator for Concat<T> {}
