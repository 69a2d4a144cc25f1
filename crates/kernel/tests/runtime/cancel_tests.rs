use super::*;

#[test]
fn clones_share_the_same_flag() {
    let cancel = ScanCancel::new();
    let observer = cancel.clone();
    assert!(!observer.is_cancelled());

    cancel.cancel();
    assert!(observer.is_cancelled());
}
