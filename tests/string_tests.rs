mod common;

use rstest::rstest;

use trymem::alloc::Metered;
use trymem::construct::{CloneIntoHold, TryClone};
use trymem::error::Error;
use trymem::raw::RawString;

use common::FlakyHold;

fn c_str_bytes<'a>(s: &'a RawString<'_>) -> &'a [u8] {
    unsafe { std::slice::from_raw_parts(s.as_c_ptr(), s.len() + 1) }
}

#[test]
fn test_string_create_and_terminator() {
    let hold = Metered::default();

    assert_eq!(hold.live(), 0);
    {
        let s = RawString::try_create(&hold, "hello").unwrap();
        assert_eq!(hold.live(), 1);
        assert_eq!(hold.used(), 6);
        assert_eq!(s.len(), 5);
        assert_eq!(s.capacity(), 5);
        assert_eq!(s.as_str(), "hello");
        assert_eq!(c_str_bytes(&s), b"hello\0");
    }
    assert_eq!(hold.live(), 0);
    assert_eq!(hold.used(), 0);
}

#[test]
fn test_string_empty_is_terminated_without_allocating() {
    let hold = Metered::default();
    let s = RawString::new(&hold);
    assert_eq!(hold.live(), 0);
    assert_eq!(s.len(), 0);
    assert_eq!(s.as_str(), "");
    assert_eq!(unsafe { *s.as_c_ptr() }, 0);
}

#[test]
fn test_string_append_grows_geometrically() {
    let hold = Metered::default();
    let mut s = RawString::try_create(&hold, "0123456789").unwrap();
    assert_eq!(s.capacity(), 10);

    s.try_append("ab").unwrap();
    // max(cap * 2, new_len)
    assert_eq!(s.capacity(), 20);
    assert_eq!(s.as_str(), "0123456789ab");

    s.try_append(&"x".repeat(64)).unwrap();
    assert_eq!(s.capacity(), 76);
    assert_eq!(s.len(), 76);
    assert_eq!(c_str_bytes(&s)[76], 0);
}

#[test]
fn test_string_append_failure_leaves_string_unchanged() {
    let hold = FlakyHold::new(1);
    let mut s = RawString::try_create(&hold, "stable").unwrap();
    assert_eq!(
        s.try_append("needs more room"),
        Err(Error::AllocationFailed)
    );
    assert_eq!(s.as_str(), "stable");
    assert_eq!(s.capacity(), 6);

    drop(s);
    assert_eq!(hold.live(), 0);
}

#[test]
fn test_string_append_fmt() {
    let hold = Metered::default();
    let mut s = RawString::new(&hold);
    s.try_append_fmt(format_args!("{}-{:04}", "job", 7)).unwrap();
    assert_eq!(s.as_str(), "job-0007");
    assert_eq!(c_str_bytes(&s), b"job-0007\0");

    s.try_append_fmt(format_args!(" ({})", true)).unwrap();
    assert_eq!(s.as_str(), "job-0007 (true)");
}

#[rstest]
#[case("héllo", 1, true)]
#[case("héllo", 2, false)]
#[case("héllo", 3, true)]
#[case("日本語", 3, true)]
#[case("日本語", 4, false)]
fn test_string_insert_respects_char_boundaries(
    #[case] content: &str,
    #[case] pos: usize,
    #[case] ok: bool,
) {
    let hold = Metered::default();
    let mut s = RawString::try_create(&hold, content).unwrap();
    let result = s.try_insert(pos, "x");
    if ok {
        result.unwrap();
        assert_eq!(s.len(), content.len() + 1);
    } else {
        assert_eq!(result, Err(Error::InvalidArgument));
        assert_eq!(s.as_str(), content);
    }
}

#[test]
fn test_string_insert_and_erase() {
    let hold = Metered::default();
    let mut s = RawString::try_create(&hold, "hard").unwrap();
    s.try_insert(4, "ware").unwrap();
    assert_eq!(s.as_str(), "hardware");

    assert_eq!(s.try_insert(9, "!"), Err(Error::OutOfRange));

    s.try_erase(0, 4).unwrap();
    assert_eq!(s.as_str(), "ware");
    assert_eq!(c_str_bytes(&s), b"ware\0");

    // Count clamps to the remaining length.
    s.try_erase(2, usize::MAX).unwrap();
    assert_eq!(s.as_str(), "wa");
    assert_eq!(s.try_erase(3, 1), Err(Error::OutOfRange));
}

#[test]
fn test_string_erase_respects_char_boundaries() {
    let hold = Metered::default();
    let mut s = RawString::try_create(&hold, "aé").unwrap();
    assert_eq!(s.try_erase(2, 1), Err(Error::InvalidArgument));
    assert_eq!(s.as_str(), "aé");
    s.try_erase(1, 2).unwrap();
    assert_eq!(s.as_str(), "a");
}

#[test]
fn test_string_pop_is_char_aware() {
    let hold = Metered::default();
    let mut s = RawString::try_create(&hold, "a日").unwrap();
    assert_eq!(s.try_pop(), Ok('日'));
    assert_eq!(s.as_str(), "a");
    assert_eq!(c_str_bytes(&s), b"a\0");
    assert_eq!(s.try_pop(), Ok('a'));
    assert_eq!(s.try_pop(), Err(Error::OutOfRange));
}

#[test]
fn test_string_assign_reuses_capacity() {
    let hold = Metered::default();
    let mut s = RawString::try_create(&hold, "a longer initial value").unwrap();
    let cap = s.capacity();

    s.try_assign("short").unwrap();
    assert_eq!(s.as_str(), "short");
    assert_eq!(s.capacity(), cap);
    assert_eq!(hold.live(), 1);

    s.try_assign(&"y".repeat(cap + 1)).unwrap();
    assert_eq!(s.len(), cap + 1);
    assert_eq!(hold.live(), 1);
}

#[test]
fn test_string_assign_to_fresh_string() {
    let hold = Metered::default();
    let mut s = RawString::new(&hold);

    // No backing store yet; assigning nothing must not touch the shared
    // terminator.
    s.try_assign("").unwrap();
    assert_eq!(s.as_str(), "");
    assert_eq!(s.capacity(), 0);
    assert_eq!(hold.live(), 0);
    assert_eq!(unsafe { *s.as_c_ptr() }, 0);

    s.try_assign("first").unwrap();
    assert_eq!(s.as_str(), "first");
    assert_eq!(hold.live(), 1);

    s.try_assign("").unwrap();
    assert_eq!(s.as_str(), "");
    assert_eq!(c_str_bytes(&s)[0], 0);
}

#[test]
fn test_string_resize() {
    let hold = Metered::default();
    let mut s = RawString::try_create(&hold, "ab").unwrap();
    s.try_resize(5, '.').unwrap();
    assert_eq!(s.as_str(), "ab...");

    s.try_resize(1, '.').unwrap();
    assert_eq!(s.as_str(), "a");
    assert_eq!(c_str_bytes(&s), b"a\0");

    // A multi-byte fill cannot keep the fill one byte wide.
    assert_eq!(s.try_resize(4, 'é'), Err(Error::InvalidArgument));
}

#[test]
fn test_string_search() {
    let hold = Metered::default();
    let s = RawString::try_create(&hold, "abracadabra").unwrap();
    assert_eq!(s.find("abra", 0), Some(0));
    assert_eq!(s.find("abra", 1), Some(7));
    assert_eq!(s.rfind("abra"), Some(7));
    assert!(s.contains("cad"));
    assert!(s.starts_with("abr"));
    assert!(s.ends_with("bra"));
    assert_eq!(s.find("zzz", 0), None);
}

#[test]
fn test_string_clone_across_holds() {
    let hold = Metered::default();
    let other = Metered::default();
    let s = RawString::try_create(&hold, "copy me").unwrap();

    let same = s.try_clone().unwrap();
    assert_eq!(same, s);
    assert_eq!(hold.live(), 2);

    let moved = s.try_clone_into_hold(&other).unwrap();
    assert_eq!(moved.as_str(), "copy me");
    assert_eq!(other.live(), 1);
}

#[test]
fn test_string_clear_and_shrink() {
    let hold = Metered::default();
    let mut s = RawString::try_create(&hold, "0123456789").unwrap();
    s.clear();
    assert_eq!(s.len(), 0);
    assert_eq!(s.capacity(), 10);
    assert_eq!(unsafe { *s.as_c_ptr() }, 0);

    s.try_shrink_to_fit().unwrap();
    assert_eq!(s.capacity(), 0);
    assert_eq!(hold.live(), 0);

    s.try_append("back").unwrap();
    assert_eq!(s.as_str(), "back");
}
