//! Element types that report what containers do to them.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Shared counters for every [`Tracked`] value made from one tally.
#[derive(Debug, Default)]
pub struct Tally {
    clones: Cell<u32>,
    drops: Cell<u32>,
}

impl Tally {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn clones(&self) -> u32 {
        self.clones.get()
    }

    pub fn drops(&self) -> u32 {
        self.drops.get()
    }

    /// Values made from this tally that are still alive.
    pub fn alive(&self, made: u32) -> u32 {
        made + self.clones() - self.drops()
    }
}

/// Make a [`Tracked`] value reporting to `tally`.
pub fn track(tally: &Rc<Tally>, value: i64) -> Tracked {
    Tracked {
        value,
        tally: Rc::clone(tally),
    }
}

/// An `i64` that counts its clones and drops.
///
/// Moves are invisible to it, so a container that relocates elements
/// without cloning leaves `clones()` untouched.
pub struct Tracked {
    pub value: i64,
    tally: Rc<Tally>,
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        self.tally.clones.set(self.tally.clones.get() + 1);
        Self {
            value: self.value,
            tally: Rc::clone(&self.tally),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.tally.drops.set(self.tally.drops.get() + 1);
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialEq<i64> for Tracked {
    fn eq(&self, other: &i64) -> bool {
        self.value == *other
    }
}

impl fmt::Debug for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tracked({})", self.value)
    }
}
