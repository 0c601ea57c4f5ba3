use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

/// A single-threaded, shared handle to a long-lived rendering system.
///
/// The device, queue and buffer registry are created once and then handed to
/// every renderer that needs them. `StSystem` is a cheap clone of the same
/// `Rc<RefCell<Box<T>>>`, so all holders observe the same instance.
///
/// # Examples
///
/// ```ignore
/// let system = StSystem::new(Box::new(42u32));
/// let shared = system.clone();
///
/// **shared.get_mut() = 100;
/// assert_eq!(**system.get(), 100);
/// ```
///
/// # Panics
/// - Panics if a borrow is held while trying to mutably borrow
/// - Panics if a mutable borrow is held while trying to borrow
pub struct StSystem<T: ?Sized> {
    pub system: Rc<RefCell<Box<T>>>,
}

impl<T: ?Sized> StSystem<T> {
    /// Creates a new `StSystem` containing the given boxed system.
    pub fn new(system: Box<T>) -> Self {
        Self {
            system: Rc::new(RefCell::new(system)),
        }
    }

    /// Returns an immutable reference to the contained system.
    ///
    /// # Panics
    /// Panics if the value is currently mutably borrowed.
    pub fn get(&self) -> Ref<'_, Box<T>> {
        self.system.borrow()
    }

    /// Returns a mutable reference to the contained system.
    ///
    /// # Panics
    /// Panics if the value is currently borrowed.
    pub fn get_mut(&self) -> RefMut<'_, Box<T>> {
        self.system.borrow_mut()
    }
}

impl<T: ?Sized> Clone for StSystem<T> {
    fn clone(&self) -> Self {
        Self {
            system: self.system.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_system() {
        let system = StSystem::new(Box::new(vec![1u32]));
        let shared = system.clone();

        shared.get_mut().push(2);

        assert_eq!(system.get().len(), 2);
    }
}
