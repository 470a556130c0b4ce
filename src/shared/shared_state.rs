use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// A slice of dashboard state shared between the components that write it
/// and the presentation layer that reads it.
///
/// Access only goes through synchronous closures, so a guard can never live
/// across an `.await` and every merge lands as one step.
pub struct Shared<T> {
    // Arc lets us share ownership. RwLock lets us read/write safely.
    inner: Arc<RwLock<T>>,
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        // A panicking writer can't leave a half-merged value: each write is one closure.
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl<T: Clone> Shared<T> {
    /// Owned copy of the latest committed value.
    pub fn snapshot(&self) -> T {
        self.read(T::clone)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|value| f.debug_tuple("Shared").field(value).finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_see_the_same_value() {
        let a = Shared::new(vec![1]);
        let b = a.clone();
        b.write(|v| v.push(2));
        assert_eq!(a.snapshot(), vec![1, 2]);
    }

    #[test]
    fn survives_a_panicking_writer() {
        let shared = Shared::new(0u32);
        let cloned = shared.clone();
        let _ = std::thread::spawn(move || {
            cloned.write(|v| {
                *v = 7;
                panic!("writer died");
            })
        })
        .join();
        assert_eq!(shared.read(|v| *v), 7);
    }
}
