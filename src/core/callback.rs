use std::{fmt, ops::Deref, rc::Rc};

/// Shared closure compared by identity.
///
/// Two callbacks are equal only when they point at the same allocation, so a
/// component can tell "the caller passed the same handler again" apart from
/// "the caller built a new one". Clone the callback to keep it stable across
/// renders.
pub struct Callback<F: ?Sized>(Rc<F>);

impl<F: ?Sized> Callback<F> {
    /// Wraps an already shared closure.
    pub fn from_rc(f: Rc<F>) -> Self {
        Self(f)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl<F: ?Sized> Clone for Callback<F> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<F: ?Sized> PartialEq for Callback<F> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<F: ?Sized> Deref for Callback<F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.0
    }
}

impl<F: ?Sized> fmt::Debug for Callback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Adder = Callback<dyn Fn(i32) -> i32>;

    fn adder(n: i32) -> Adder {
        Callback::from_rc(Rc::new(move |x: i32| x + n))
    }

    #[test]
    fn test_identity_equality() {
        let a = adder(1);
        let b = a.clone();
        let c = adder(1);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a(2), 3);
        assert_eq!(c(2), 3);
    }
}
