use super::*;

#[test]
fn test_level_from_warning_count() {
    assert_eq!(ConditionLevel::from_warning_count(0), ConditionLevel::INFO);
    assert_eq!(ConditionLevel::from_warning_count(1), ConditionLevel::WARNING);
    assert_eq!(ConditionLevel::from_warning_count(2), ConditionLevel::WARNING);
    assert_eq!(ConditionLevel::from_warning_count(3), ConditionLevel::CRITICAL);
}

#[test]
fn test_parse_filter() {
    assert_eq!(ConditionLevel::parse_filter("i,w,c"), ConditionLevel::ALL);
    assert_eq!(
        ConditionLevel::parse_filter("info,critical"),
        ConditionLevel::INFO | ConditionLevel::CRITICAL
    );
    assert_eq!(ConditionLevel::parse_filter("w"), ConditionLevel::WARNING);
}

#[test]
fn test_parse_filter_ignores_garbage() {
    assert_eq!(ConditionLevel::parse_filter(""), ConditionLevel::NONE);
    assert_eq!(ConditionLevel::parse_filter(",,x,z"), ConditionLevel::NONE);
    assert_eq!(ConditionLevel::parse_filter("x,c,"), ConditionLevel::CRITICAL);
}

#[test]
fn test_set_operations() {
    let filter = ConditionLevel::INFO | ConditionLevel::WARNING;
    assert!(filter.contains(ConditionLevel::INFO));
    assert!(!filter.contains(ConditionLevel::CRITICAL));
    assert!(!filter.contains(ConditionLevel::ALL));
    assert!(filter.intersects(ConditionLevel::WARNING | ConditionLevel::CRITICAL));
    assert!(!filter.intersects(ConditionLevel::CRITICAL));
    assert!(ConditionLevel::NONE.is_empty());
    assert!(ConditionLevel::ALL.contains(filter));
}

#[test]
fn test_labels() {
    assert_eq!(ConditionLevel::INFO.label(), Some("info"));
    assert_eq!(ConditionLevel::WARNING.label(), Some("warning"));
    assert_eq!(ConditionLevel::CRITICAL.label(), Some("critical"));
    assert_eq!(ConditionLevel::ALL.label(), None);
    assert_eq!(ConditionLevel::from_label("warning"), Some(ConditionLevel::WARNING));
    assert_eq!(ConditionLevel::from_label("Warning"), None);
    assert_eq!(ConditionLevel::ALL.to_string(), "{info,warning,critical}");
}

#[test]
fn test_condition_string_format() {
    let flags = ConditionFlags::new(true, false, true);
    assert_eq!(
        flags.condition_string(),
        "is_dirty=true,is_overweight=false,is_broken=true"
    );
    assert_eq!(flags.warning_count(), 2);
    assert_eq!(flags.level(), ConditionLevel::WARNING);
}

#[test]
fn test_record_level_tracks_flags() {
    let info = ConditionRecord::new(1, 100, ConditionFlags::default(), true, "ok");
    assert_eq!(info.level(), ConditionLevel::INFO);
    assert_eq!(info.level_label(), "info");

    let critical = ConditionRecord::new(1, 200, ConditionFlags::new(true, true, true), false, "");
    assert_eq!(critical.level(), ConditionLevel::CRITICAL);
    assert_eq!(critical.level_label(), "critical");
    assert!(critical.is_dirty() && critical.is_overweight() && critical.is_broken());
}

#[test]
fn test_cursor_key_less_is_strict() {
    let a = CursorKey::new(100);
    let b = CursorKey::new(200);
    assert!(a.less(&b));
    assert!(!b.less(&a));
    assert!(!a.less(&CursorKey::new(100)));
}
