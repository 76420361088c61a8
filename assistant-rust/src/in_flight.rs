use std::sync::{Mutex, PoisonError};

/// The model call a surface is waiting on, if any.
///
/// Claiming the slot hands out a guard. The slot frees itself when the guard
/// is dropped, whether the call finished or the caller's future was dropped
/// halfway through it.
#[derive(Debug)]
pub(crate) struct InFlight<A> {
    activity: Mutex<Option<A>>,
}

impl<A: Copy> InFlight<A> {
    pub(crate) fn new() -> Self {
        Self {
            activity: Mutex::new(None),
        }
    }

    pub(crate) fn current(&self) -> Option<A> {
        *self.activity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the slot for `activity`. Fails with the running activity when
    /// the slot is taken.
    pub(crate) fn begin(&self, activity: A) -> Result<InFlightGuard<'_, A>, A> {
        let mut slot = self.activity.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(running) = *slot {
            return Err(running);
        }
        *slot = Some(activity);
        Ok(InFlightGuard { owner: self })
    }
}

pub(crate) struct InFlightGuard<'a, A> {
    owner: &'a InFlight<A>,
}

impl<A> Drop for InFlightGuard<'_, A> {
    fn drop(&mut self) {
        *self
            .owner
            .activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Work {
        Read,
        Write,
    }

    #[test]
    fn second_claim_reports_the_running_activity() {
        let slot = InFlight::new();
        let _guard = slot.begin(Work::Read).unwrap();
        assert_eq!(slot.begin(Work::Write).err(), Some(Work::Read));
        assert_eq!(slot.current(), Some(Work::Read));
    }

    #[test]
    fn dropping_the_guard_frees_the_slot() {
        let slot = InFlight::new();
        drop(slot.begin(Work::Write).unwrap());
        assert_eq!(slot.current(), None);
        assert!(slot.begin(Work::Read).is_ok());
    }
}
