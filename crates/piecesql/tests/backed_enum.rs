#![cfg(feature = "derive")]

use piecesql::{BackedEnum, BackedValue, LiteralConnection, Query};

#[derive(Debug, Clone, Copy, BackedEnum)]
enum Status {
    Active,
    OnHold,
    #[piece(rename = "gone")]
    Deleted,
}

#[derive(Debug, Clone, Copy, BackedEnum)]
#[piece(rename_all = "SCREAMING_SNAKE_CASE")]
enum Region {
    EuWest,
}

#[derive(Debug, Clone, Copy, BackedEnum)]
#[piece(int)]
enum Priority {
    Low = 1,
    High = 10,
}

#[test]
fn string_backed_variants_follow_rename_rules() {
    assert_eq!(Status::Active.backing_value(), BackedValue::Text("active".into()));
    assert_eq!(Status::OnHold.backing_value(), BackedValue::Text("on_hold".into()));
    assert_eq!(Status::Deleted.backing_value(), BackedValue::Text("gone".into()));
    assert_eq!(Region::EuWest.backing_value(), BackedValue::Text("EU_WEST".into()));
}

#[test]
fn int_backed_variants_use_discriminants() {
    assert_eq!(Priority::Low.backing_value(), BackedValue::Int(1));
    assert_eq!(Priority::High.backing_value(), BackedValue::Int(10));
}

#[test]
fn backed_enums_render_as_literals_not_parameters() {
    let mut q = Query::new(LiteralConnection::mysql().into_shared());
    q.select_all()
        .from("tasks")
        .where_("status", Status::OnHold)
        .where_("priority", Priority::High)
        .where_in("region", [Region::EuWest]);
    assert_eq!(
        q.to_sql(),
        "select * from `tasks` where `status` = 'on_hold' and `priority` = 10 and `region` in ('EU_WEST')"
    );
    assert!(q.params().is_empty());
}
