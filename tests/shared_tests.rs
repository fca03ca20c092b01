mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use trymem::alloc::{global, Metered};
use trymem::construct::TryConstruct;
use trymem::error::Error;
use trymem::raw::RawBuf;
use trymem::shared::{SelfRef, Shared, SharedFromSelf, Weak};

use common::FlakyHold;

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
fn test_shared_combined_accounting() {
    let hold = Metered::default();

    assert_eq!(hold.live(), 0);
    {
        let x = Shared::<usize>::try_new(&hold, 5usize).unwrap();
        assert_eq!(hold.live(), 1);
        assert_eq!(*x, 5);
        assert_eq!(Shared::use_count(&x), 1);
        assert_eq!(Shared::weak_count(&x), 0);

        let y = x.clone();
        assert_eq!(Shared::use_count(&x), 2);
        assert_eq!(hold.live(), 1);
        assert!(Shared::ptr_eq(&x, &y));
    }
    assert_eq!(hold.live(), 0);
    assert_eq!(hold.used(), 0);
}

#[test]
fn test_shared_value_dropped_exactly_once() {
    let drops = Arc::new(AtomicUsize::new(0));
    let hold = Metered::default();
    {
        let x = Shared::<Counted>::try_new(
            &hold,
            Counted {
                value: 9,
                drops: drops.clone(),
            },
        )
        .unwrap();
        let y = x.clone();
        let z = y.clone();
        assert_eq!(z.value, 9);
        assert_eq!(Shared::use_count(&x), 3);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
    }
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(hold.live(), 0);
}

#[test]
fn test_shared_combined_keeps_block_while_weak_lives() {
    let drops = Arc::new(AtomicUsize::new(0));
    let hold = Metered::default();
    let weak;
    {
        let x = Shared::<Counted>::try_new(
            &hold,
            Counted {
                value: 1,
                drops: drops.clone(),
            },
        )
        .unwrap();
        weak = Shared::downgrade(&x);
        assert_eq!(Shared::weak_count(&x), 1);
    }
    // The value died with the last strong handle, but the combined block
    // stays until the weak handle goes.
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(hold.live(), 1);
    assert_eq!(weak.upgrade().err(), Some(Error::PointerExpired));
    assert!(weak.expired());

    drop(weak);
    assert_eq!(hold.live(), 0);
}

#[test]
fn test_shared_split_releases_value_block_eagerly() {
    let hold = Metered::default();
    let weak;
    {
        let x = Shared::<u64>::try_new_split(&hold, 7u64).unwrap();
        // One block for the value, one for the header.
        assert_eq!(hold.live(), 2);
        assert_eq!(*x, 7);
        weak = Shared::downgrade(&x);
    }
    // The value block went back with the last strong handle.
    assert_eq!(hold.live(), 1);
    assert_eq!(weak.upgrade().err(), Some(Error::PointerExpired));

    drop(weak);
    assert_eq!(hold.live(), 0);
}

#[test]
fn test_shared_allocation_failure_leaks_nothing() {
    let hold = FlakyHold::new(0);
    assert_eq!(
        Shared::<u64>::try_new(&hold, 1u64).err(),
        Some(Error::AllocationFailed)
    );
    assert_eq!(hold.live(), 0);

    hold.set_budget(1);
    // The split creation gets the value block but not the header block.
    assert_eq!(
        Shared::<u64>::try_new_split(&hold, 1u64).err(),
        Some(Error::AllocationFailed)
    );
    assert_eq!(hold.live(), 0);
    assert_eq!(hold.used(), 0);
}

#[derive(Default)]
struct Guarded {
    value: usize,
}

impl TryConstruct<usize> for Guarded {
    fn try_construct(&mut self, _hold: &dyn trymem::alloc::Hold, value: usize) -> trymem::Result<()> {
        if value == 13 {
            return Err(Error::InvalidArgument);
        }
        self.value = value;
        Ok(())
    }
}

trymem::construct_by_hook!(Guarded, usize);

#[test]
fn test_shared_construction_failure_releases_block() {
    let hold = Metered::default();
    assert_eq!(
        Shared::<Guarded>::try_new(&hold, 13usize).err(),
        Some(Error::InvalidArgument)
    );
    assert_eq!(hold.live(), 0);
    assert_eq!(hold.used(), 0);

    let x = Shared::<Guarded>::try_new(&hold, 5usize).unwrap();
    assert_eq!(x.value, 5);
}

#[test]
fn test_shared_get_is_stable_across_clones() {
    let hold = Metered::default();
    let x = Shared::<u32>::try_new(&hold, 11u32).unwrap();
    let y = x.clone();
    assert_eq!(Shared::get(&x), Shared::get(&y));
    assert_eq!(unsafe { *Shared::get(&x) }, 11);
}

#[test]
fn test_weak_unbound_is_empty() {
    let weak = Weak::<u64>::new();
    assert!(weak.expired());
    assert_eq!(weak.upgrade().err(), Some(Error::EmptyPointer));

    let other = Weak::<u64>::new();
    assert!(weak.ptr_eq(&other));
}

struct SelfLink<'a> {
    me: Weak<'a, SelfLink<'a>>,
}

#[test]
fn test_shared_cyclic_creation() {
    let hold = Metered::default();
    let x = Shared::<SelfLink<'_>>::try_new_cyclic(&hold, |weak| {
        // Not live yet; the value has not been written.
        assert_eq!(weak.upgrade().err(), Some(Error::PointerExpired));
        Ok(SelfLink { me: weak.clone() })
    })
    .unwrap();

    assert_eq!(Shared::use_count(&x), 1);
    let me = x.me.upgrade().unwrap();
    assert!(Shared::ptr_eq(&x, &me));

    drop(me);
    drop(x);
    assert_eq!(hold.live(), 0);
}

#[test]
fn test_shared_cyclic_failure_releases_block() {
    let hold = Metered::default();
    let result = Shared::<SelfLink<'_>>::try_new_cyclic(&hold, |_weak| Err(Error::OutOfRange));
    assert_eq!(result.err(), Some(Error::OutOfRange));
    assert_eq!(hold.live(), 0);
}

struct Node<'a> {
    name: u32,
    self_ref: SelfRef<'a, Node<'a>>,
}

impl<'a> SharedFromSelf<'a> for Node<'a> {
    fn self_ref(&self) -> &SelfRef<'a, Node<'a>> {
        &self.self_ref
    }
}

#[test]
fn test_shared_from_self() {
    let hold = Metered::default();
    let x = Shared::<Node<'_>>::try_new_with_self(
        &hold,
        Node {
            name: 7,
            self_ref: SelfRef::new(),
        },
    )
    .unwrap();

    let again = x.shared_from_self().unwrap();
    assert_eq!(again.name, 7);
    assert!(Shared::ptr_eq(&x, &again));
    assert_eq!(Shared::use_count(&x), 2);

    // A value never routed through creation has no self handle.
    let plain = Node {
        name: 8,
        self_ref: SelfRef::new(),
    };
    assert_eq!(plain.shared_from_self().err(), Some(Error::EmptyPointer));
}

struct Pair {
    label: u32,
    payload: u64,
}

#[test]
fn test_shared_map_projection() {
    let drops = Arc::new(AtomicUsize::new(0));
    let hold = Metered::default();
    let payload;
    {
        let pair = Shared::<(Pair, Counted)>::try_new(
            &hold,
            (
                Pair {
                    label: 3,
                    payload: 99,
                },
                Counted {
                    value: 0,
                    drops: drops.clone(),
                },
            ),
        )
        .unwrap();
        payload = Shared::map(&pair, |value| &value.0.payload);
        assert_eq!(*payload, 99);
        assert_eq!(Shared::use_count(&pair), 2);
        assert_eq!(pair.0.label, 3);
    }
    // The projected handle keeps the whole value alive.
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    assert_eq!(*payload, 99);

    drop(payload);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(hold.live(), 0);
}

#[test]
fn test_shared_handles_relocate_in_buffer() {
    let hold = Metered::default();
    let x = Shared::<u32>::try_new(&hold, 3u32).unwrap();

    let mut strongs = RawBuf::new(&hold);
    let mut weaks = RawBuf::new(&hold);
    // Enough handles to force the buffers through a growth step.
    for _ in 0..9 {
        strongs.try_push(x.clone()).unwrap();
        weaks.try_push(Shared::downgrade(&x)).unwrap();
    }
    assert_eq!(Shared::use_count(&x), 10);
    assert_eq!(Shared::weak_count(&x), 9);
    for handle in strongs.iter() {
        assert_eq!(**handle, 3);
        assert!(Shared::ptr_eq(handle, &x));
    }
    for handle in weaks.iter() {
        assert_eq!(*handle.upgrade().unwrap(), 3);
    }

    drop(strongs);
    drop(weaks);
    assert_eq!(Shared::use_count(&x), 1);
    assert_eq!(Shared::weak_count(&x), 0);
}

#[test]
fn test_shared_concurrent_upgrade_race() {
    common::init_logs();
    let shared = Shared::<u64>::try_new(global(), 42u64).unwrap();
    let weak = Shared::downgrade(&shared);

    let mut workers = Vec::new();
    for _ in 0..4 {
        let weak = weak.clone();
        workers.push(thread::spawn(move || {
            for _ in 0..10_000 {
                match weak.upgrade() {
                    Ok(strong) => assert_eq!(*strong, 42),
                    Err(error) => assert_eq!(error, Error::PointerExpired),
                }
            }
        }));
    }

    thread::sleep(std::time::Duration::from_millis(1));
    drop(shared);

    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(weak.upgrade().err(), Some(Error::PointerExpired));
}

#[test]
fn test_shared_concurrent_clone_drop() {
    let shared = Shared::<u32>::try_new(global(), 7u32).unwrap();

    let mut workers = Vec::new();
    for _ in 0..4 {
        let shared = shared.clone();
        workers.push(thread::spawn(move || {
            for _ in 0..10_000 {
                let copy = shared.clone();
                assert_eq!(*copy, 7);
            }
        }));
    }
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(Shared::use_count(&shared), 1);
}
