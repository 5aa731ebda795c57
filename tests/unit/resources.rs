use super::*;

#[test]
fn drop_releases_exactly_once() {
    let tracker = ResourceTracker::new();
    let a = tracker.track(ResourceKind::Bitmap, vec![0u8; 4]);
    let b = tracker.track(ResourceKind::CommandList, ());
    assert_eq!(tracker.stats().live(ResourceKind::Bitmap), 1);
    assert_eq!(tracker.stats().total_live(), 2);

    drop(a);
    let st = tracker.stats();
    assert_eq!(st.created(ResourceKind::Bitmap), 1);
    assert_eq!(st.released(ResourceKind::Bitmap), 1);
    assert_eq!(st.live(ResourceKind::CommandList), 1);

    drop(b);
    assert_eq!(tracker.stats().total_live(), 0);
}

#[test]
fn clones_share_counters() {
    let tracker = ResourceTracker::new();
    let other = tracker.clone();
    let _r = other.track(ResourceKind::Factory, 1u32);
    assert_eq!(tracker.stats().live(ResourceKind::Factory), 1);
}

#[test]
fn replacing_a_slot_releases_the_old_value() {
    let tracker = ResourceTracker::new();
    let mut slot = tracker.track(ResourceKind::Intermediate, 1u32);
    assert_eq!(*slot, 1);
    slot = tracker.track(ResourceKind::Intermediate, 2u32);
    assert_eq!(*slot, 2);
    let st = tracker.stats();
    assert_eq!(st.created(ResourceKind::Intermediate), 2);
    assert_eq!(st.released(ResourceKind::Intermediate), 1);
}
