use super::*;

#[test]
fn version_advances_by_one_and_orders() {
    let v = Version::INITIAL;
    assert_eq!(v.next(), Version(1));
    assert!(v.next() > v);
    assert_eq!(Version(u64::MAX).next(), Version(u64::MAX));
}

#[test]
fn ids_display_with_kind_prefix() {
    assert_eq!(NodeId(3).to_string(), "node#3");
    assert_eq!(DataId(7).to_string(), "data#7");
    assert_eq!(DeviceId(2).as_u32(), 2);
}
