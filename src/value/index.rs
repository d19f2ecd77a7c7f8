use crate::Value;

mod private {
    pub trait Sealed {}
    impl Sealed for usize {}
    impl Sealed for str {}
    impl Sealed for String {}
    impl<T> Sealed for &T where T: ?Sized + Sealed {}
}

/// Dispatches an index expression to the numeric or keyed lookup path.
///
/// Implemented for `usize` (array position) and string types (object key),
/// so `value[0]` and `value["key"]` both work through [`std::ops::Index`].
pub trait Index: private::Sealed {
    #[doc(hidden)]
    fn index_dispatch<'a, R>(
        &self,
        value: &'a Value,
        n: impl FnOnce(&'a Value, usize) -> R,
        s: impl FnOnce(&'a Value, &str) -> R,
    ) -> R;

    #[doc(hidden)]
    fn index_dispatch_mut<'a, R>(
        &self,
        value: &'a mut Value,
        n: impl FnOnce(&'a mut Value, usize) -> R,
        s: impl FnOnce(&'a mut Value, &str) -> R,
    ) -> R;
}

impl Index for usize {
    #[inline]
    fn index_dispatch<'a, R>(
        &self,
        value: &'a Value,
        n: impl FnOnce(&'a Value, usize) -> R,
        _: impl FnOnce(&'a Value, &str) -> R,
    ) -> R {
        n(value, *self)
    }

    #[inline]
    fn index_dispatch_mut<'a, R>(
        &self,
        value: &'a mut Value,
        n: impl FnOnce(&'a mut Value, usize) -> R,
        _: impl FnOnce(&'a mut Value, &str) -> R,
    ) -> R {
        n(value, *self)
    }
}

impl Index for str {
    #[inline]
    fn index_dispatch<'a, R>(
        &self,
        value: &'a Value,
        _: impl FnOnce(&'a Value, usize) -> R,
        s: impl FnOnce(&'a Value, &str) -> R,
    ) -> R {
        s(value, self)
    }

    #[inline]
    fn index_dispatch_mut<'a, R>(
        &self,
        value: &'a mut Value,
        _: impl FnOnce(&'a mut Value, usize) -> R,
        s: impl FnOnce(&'a mut Value, &str) -> R,
    ) -> R {
        s(value, self)
    }
}

impl Index for String {
    #[inline]
    fn index_dispatch<'a, R>(
        &self,
        value: &'a Value,
        _: impl FnOnce(&'a Value, usize) -> R,
        s: impl FnOnce(&'a Value, &str) -> R,
    ) -> R {
        s(value, self.as_str())
    }

    #[inline]
    fn index_dispatch_mut<'a, R>(
        &self,
        value: &'a mut Value,
        _: impl FnOnce(&'a mut Value, usize) -> R,
        s: impl FnOnce(&'a mut Value, &str) -> R,
    ) -> R {
        s(value, self.as_str())
    }
}

impl<T: ?Sized + Index> Index for &T {
    #[inline]
    fn index_dispatch<'a, R>(
        &self,
        value: &'a Value,
        n: impl FnOnce(&'a Value, usize) -> R,
        s: impl FnOnce(&'a Value, &str) -> R,
    ) -> R {
        (**self).index_dispatch(value, n, s)
    }

    #[inline]
    fn index_dispatch_mut<'a, R>(
        &self,
        value: &'a mut Value,
        n: impl FnOnce(&'a mut Value, usize) -> R,
        s: impl FnOnce(&'a mut Value, &str) -> R,
    ) -> R {
        (**self).index_dispatch_mut(value, n, s)
    }
}
