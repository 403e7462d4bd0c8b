/// Holds at most one live GPU resource.
///
/// The old resource is always handed to its release function before a replacement is
/// allocated, so two generations of the same logical resource are never alive together.
#[derive(Debug)]
pub enum ResourceSlot<T> {
    Empty,
    Allocated(T),
}

impl<T> Default for ResourceSlot<T> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<T> ResourceSlot<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Empty => None,
            Self::Allocated(resource) => Some(resource),
        }
    }

    pub fn is_allocated(&self) -> bool {
        matches!(self, Self::Allocated(_))
    }

    /// Releases the current resource, if any, then stores the one built by `allocate`.
    pub fn replace<C>(
        &mut self,
        ctx: &mut C,
        release: impl FnOnce(&mut C, T),
        allocate: impl FnOnce(&mut C) -> T,
    ) -> &T {
        self.release(ctx, release);
        *self = Self::Allocated(allocate(ctx));
        match self {
            Self::Allocated(resource) => resource,
            Self::Empty => unreachable!("slot was just filled"),
        }
    }

    /// Releases the current resource. Returns `false` if the slot was already empty.
    pub fn release<C>(&mut self, ctx: &mut C, release: impl FnOnce(&mut C, T)) -> bool {
        match std::mem::take(self) {
            Self::Allocated(resource) => {
                release(ctx, resource);
                true
            }
            Self::Empty => false,
        }
    }
}
