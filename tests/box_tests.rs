mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use trymem::alloc::Metered;
use trymem::construct::{CloneIntoHold, TryClone};
use trymem::error::Error;
use trymem::raw::RawBox;

use common::FlakyHold;

#[test]
fn test_box_new_and_deref() {
    let hold = Metered::default();

    assert_eq!(hold.live(), 0);
    {
        let mut x = RawBox::<usize>::try_new(&hold, 5usize).unwrap();
        assert_eq!(hold.live(), 1);
        assert_eq!(hold.used(), 8);
        assert_eq!(*x, 5);

        *x += 10;
        assert_eq!(*x, 15);
    }
    assert_eq!(hold.live(), 0);
    assert_eq!(hold.used(), 0);
}

#[test]
fn test_box_allocation_failure() {
    let hold = FlakyHold::new(0);
    assert_eq!(
        RawBox::<usize>::try_new(&hold, 5usize).err(),
        Some(Error::AllocationFailed)
    );
    assert_eq!(hold.live(), 0);
}

struct Counted {
    value: usize,
    drops: Arc<AtomicUsize>,
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_box_into_inner_releases_allocation_without_dropping() {
    let drops = Arc::new(AtomicUsize::new(0));
    let hold = Metered::default();
    let x = RawBox::<Counted>::try_new(
        &hold,
        Counted {
            value: 3,
            drops: drops.clone(),
        },
    )
    .unwrap();
    assert_eq!(hold.live(), 1);

    let inner = x.into_inner();
    assert_eq!(hold.live(), 0);
    assert_eq!(inner.value, 3);
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    drop(inner);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_box_clone() {
    let hold = Metered::default();
    let other = Metered::default();
    let x = RawBox::<u32>::try_new(&hold, 21u32).unwrap();

    let y = x.try_clone().unwrap();
    assert_eq!(*y, 21);
    assert_eq!(hold.live(), 2);

    let z = x.try_clone_into_hold(&other).unwrap();
    assert_eq!(*z, 21);
    assert_eq!(other.live(), 1);
}
