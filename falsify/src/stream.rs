//! Lazy, single-pass sequences used for generation and shrinking.

use std::fmt;
use std::iter;

/// A lazy sequence that yields each element at most once.
///
/// Shrink trees can be infinite, so nothing here ever materializes more
/// than what a consumer pulls. All combinators consume the stream and
/// return a new one.
pub struct Stream<'a, T> {
    inner: Box<dyn Iterator<Item = T> + 'a>,
}

impl<'a, T: 'a> Stream<'a, T> {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = T> + 'a,
    {
        Self {
            inner: Box::new(iter.fuse()),
        }
    }

    /// The empty stream
    pub fn nil() -> Self {
        Self::new(iter::empty())
    }

    pub fn of(values: Vec<T>) -> Self {
        Self::new(values.into_iter())
    }

    /// A stream pulling from `next` until it returns `None`
    pub fn from_fn<F>(next: F) -> Self
    where
        F: FnMut() -> Option<T> + 'a,
    {
        Self::new(iter::from_fn(next))
    }

    pub fn map<U: 'a, F>(self, f: F) -> Stream<'a, U>
    where
        F: FnMut(T) -> U + 'a,
    {
        Stream::new(self.inner.map(f))
    }

    pub fn flat_map<U: 'a, F>(self, f: F) -> Stream<'a, U>
    where
        F: FnMut(T) -> Stream<'a, U> + 'a,
    {
        Stream::new(self.inner.flat_map(f))
    }

    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: FnMut(&T) -> bool + 'a,
    {
        Self::new(self.inner.filter(predicate))
    }

    /// At most the first `n` elements. Never pulls the element after them.
    pub fn take(self, n: usize) -> Self {
        Self::new(self.inner.take(n))
    }

    pub fn take_while<F>(self, predicate: F) -> Self
    where
        F: FnMut(&T) -> bool + 'a,
    {
        Self::new(self.inner.take_while(predicate))
    }

    /// Drops the first `n` elements when first pulled
    pub fn skip(self, n: usize) -> Self {
        Self::new(self.inner.skip(n))
    }

    pub fn skip_while<F>(self, predicate: F) -> Self
    where
        F: FnMut(&T) -> bool + 'a,
    {
        Self::new(self.inner.skip_while(predicate))
    }

    /// This stream followed by each of `others`, in order
    pub fn join(self, others: impl IntoIterator<Item = Stream<'a, T>> + 'a) -> Self {
        Self::new(self.inner.chain(others.into_iter().flatten()))
    }

    /// Whether every element satisfies `predicate`. Stops at the first miss.
    pub fn every<F>(mut self, predicate: F) -> bool
    where
        F: FnMut(T) -> bool,
    {
        self.inner.all(predicate)
    }

    /// The first element satisfying `predicate`, if any
    pub fn has<F>(mut self, predicate: F) -> Option<T>
    where
        F: FnMut(&T) -> bool,
    {
        self.inner.find(predicate)
    }

    /// The `n`-th element, or the last one when the stream is shorter
    pub fn nth_or_last(self, n: usize) -> Option<T> {
        let mut last = None;
        for (index, item) in self.inner.enumerate() {
            if index == n {
                return Some(item);
            }
            last = Some(item);
        }
        last
    }

    pub fn first(self) -> Option<T> {
        self.nth_or_last(0)
    }
}

impl<T> Iterator for Stream<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> fmt::Debug for Stream<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn naturals<'a>() -> Stream<'a, u64> {
        let mut next = 0u64;
        Stream::from_fn(move || {
            let current = next;
            next += 1;
            Some(current)
        })
    }

    #[test]
    fn test_combinators_on_infinite_stream() {
        let evens: Vec<_> = naturals()
            .filter(|n| n % 2 == 0)
            .map(|n| n * 10)
            .skip(1)
            .take(3)
            .collect();
        assert_eq!(evens, vec![20, 40, 60]);

        let small: Vec<_> = naturals().take_while(|n| *n < 4).collect();
        assert_eq!(small, vec![0, 1, 2, 3]);

        let rest: Vec<_> = naturals().skip_while(|n| *n < 5).take(2).collect();
        assert_eq!(rest, vec![5, 6]);
    }

    #[test]
    fn test_take_never_pulls_past_its_bound() {
        let pulls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&pulls);
        let stream = Stream::from_fn(move || {
            counter.set(counter.get() + 1);
            Some(counter.get())
        });

        let taken: Vec<_> = stream.take(2).collect();
        assert_eq!(taken, vec![1, 2]);
        assert_eq!(pulls.get(), 2);

        let untouched = Rc::new(Cell::new(0));
        let counter = Rc::clone(&untouched);
        let _ = Stream::from_fn(move || {
            counter.set(counter.get() + 1);
            Some(())
        })
        .take(0)
        .count();
        assert_eq!(untouched.get(), 0);
    }

    #[test]
    fn test_flat_map_and_join() {
        let nested: Vec<_> = Stream::of(vec![1, 2, 3])
            .flat_map(|n| Stream::of(vec![n; n]))
            .collect();
        assert_eq!(nested, vec![1, 2, 2, 3, 3, 3]);

        let joined: Vec<_> = Stream::of(vec![1])
            .join([Stream::nil(), Stream::of(vec![2, 3]), Stream::of(vec![4])])
            .collect();
        assert_eq!(joined, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_every_and_has() {
        assert!(Stream::of(vec![2, 4, 6]).every(|n| n % 2 == 0));
        assert!(!naturals().every(|n| n < 10));
        assert!(Stream::<u8>::nil().every(|_| false));

        assert_eq!(naturals().has(|n| *n > 41), Some(42));
        assert_eq!(Stream::of(vec![1, 3]).has(|n| n % 2 == 0), None);
    }

    #[test]
    fn test_nth_or_last() {
        assert_eq!(Stream::of(vec![1, 2, 3]).nth_or_last(1), Some(2));
        assert_eq!(Stream::of(vec![1, 2, 3]).nth_or_last(10), Some(3));
        assert_eq!(Stream::<u8>::nil().nth_or_last(0), None);
        assert_eq!(naturals().skip(7).first(), Some(7));
    }

    #[test]
    fn test_exhausted_stream_stays_exhausted() {
        let mut flip = false;
        let mut stream = Stream::from_fn(move || {
            flip = !flip;
            if flip { None } else { Some(1) }
        });
        assert_eq!(stream.next(), None);
        assert_eq!(stream.next(), None);
    }
}
