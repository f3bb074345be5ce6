//! Generated values paired with the shrink context of their producer.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Opaque data an arbitrary attaches to a value to guide later shrinks.
///
/// Only the arbitrary that created a context knows how to read it back,
/// usually through `Rc::downcast` or `<dyn Any>::downcast_ref`.
pub type Context = Rc<dyn Any>;

/// A generated value, its shrink context and its read policy.
///
/// Values whose type can be mutated through a shared reference (cells,
/// buffers behind `RefCell`) should be built with [`Value::cloneable`] or
/// [`Value::with_cloner`]: every read after the first then hands out a
/// fresh copy, so a predicate that mutates its input cannot corrupt the
/// copy kept for reporting.
pub struct Value<T> {
    value: Rc<T>,
    context: Option<Context>,
    cloner: Option<fn(&T) -> T>,
    read: Cell<bool>,
}

impl<T> Value<T> {
    /// A value that is shared as-is on every read
    pub fn new(value: T, context: Option<Context>) -> Self {
        Self::from_rc(Rc::new(value), context)
    }

    pub fn from_rc(value: Rc<T>, context: Option<Context>) -> Self {
        Self {
            value,
            context,
            cloner: None,
            read: Cell::new(false),
        }
    }

    /// A value copied with `cloner` on every read but the first
    pub fn with_cloner(value: T, context: Option<Context>, cloner: fn(&T) -> T) -> Self {
        Self {
            value: Rc::new(value),
            context,
            cloner: Some(cloner),
            read: Cell::new(false),
        }
    }

    /// The value handed to the predicate.
    ///
    /// The first call returns the stored instance. Later calls return a
    /// fresh copy when the value has a clone capability.
    pub fn value(&self) -> Rc<T> {
        if !self.read.replace(true) {
            return Rc::clone(&self.value);
        }
        match self.cloner {
            Some(clone) => Rc::new(clone(&self.value)),
            None => Rc::clone(&self.value),
        }
    }

    /// The stored instance, without counting as a read
    pub fn raw(&self) -> &Rc<T> {
        &self.value
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn has_to_be_cloned(&self) -> bool {
        self.cloner.is_some()
    }

    pub(crate) fn with_context(mut self, context: Option<Context>) -> Self {
        self.context = context;
        self
    }
}

impl<T: Clone> Value<T> {
    /// A value copied with `Clone::clone` on every read but the first
    pub fn cloneable(value: T, context: Option<Context>) -> Self {
        Self::with_cloner(value, context, T::clone)
    }
}

impl<T> Clone for Value<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            context: self.context.clone(),
            cloner: self.cloner,
            read: Cell::new(self.read.get()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("value", &self.value)
            .field("has_context", &self.context.is_some())
            .field("has_to_be_cloned", &self.has_to_be_cloned())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_plain_value_shares_instance() {
        let value = Value::new(vec![1, 2, 3], None);
        let first = value.value();
        let second = value.value();

        assert!(Rc::ptr_eq(&first, &second));
        assert!(Rc::ptr_eq(&first, value.raw()));
        assert!(!value.has_to_be_cloned());
    }

    #[test]
    fn test_cloneable_value_copies_after_first_read() {
        let value = Value::cloneable(RefCell::new(vec![1]), None);

        let first = value.value();
        assert!(Rc::ptr_eq(&first, value.raw()));

        // mutate the first read through the cell
        first.borrow_mut().push(2);

        let second = value.value();
        assert!(!Rc::ptr_eq(&second, value.raw()));
        assert_eq!(*second.borrow(), vec![1, 2]);

        second.borrow_mut().push(3);
        assert_eq!(*value.raw().borrow(), vec![1, 2]);
    }

    #[test]
    fn test_raw_does_not_count_as_read() {
        let value = Value::cloneable(5u8, None);
        let _ = value.raw();
        let _ = value.raw();
        assert!(Rc::ptr_eq(&value.value(), value.raw()));
    }

    #[test]
    fn test_context_is_kept() {
        let context: Context = Rc::new(7usize);
        let value = Value::new("abc", Some(context));

        let stored = value.context().and_then(|ctx| ctx.downcast_ref::<usize>());
        assert_eq!(stored, Some(&7));

        let stripped = value.with_context(None);
        assert!(stripped.context().is_none());
    }
}
