//! Storage-level checks for the reaction toggle, follow uniqueness, and
//! the notification/announcement read flows.

use cartelera_db::Database;
use cartelera_db::models::EventRow;
use cartelera_types::models::ReactionKind;

fn open_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&dir.path().join("test.db")).unwrap();
    (dir, db)
}

fn seed_user(db: &Database, id: &str, name: &str) {
    db.create_profile(
        id,
        &format!("{id}@example.com"),
        "argon2-hash",
        name,
        "https://example.com/avatar.png",
        None,
        None,
    )
    .unwrap();
}

fn seed_event(db: &Database, id: &str, organizer_id: &str) {
    db.insert_event(&EventRow {
        id: id.into(),
        title: "Peña de prueba".into(),
        description: "desc".into(),
        event_type: "pena".into(),
        date: "2026-12-01T21:00:00+00:00".into(),
        province: "Salta".into(),
        city: "Salta".into(),
        address: "Calle Falsa 123".into(),
        is_free: true,
        price_anticipada: None,
        price_general: None,
        multimedia: "[]".into(),
        organizer_id: organizer_id.into(),
        organizer_name: String::new(),
        organizer_avatar: String::new(),
        created_at: "2026-08-01T00:00:00+00:00".into(),
    })
    .unwrap();
}

#[test]
fn toggle_is_an_on_off_switch() {
    let (_dir, db) = open_db();
    seed_user(&db, "u1", "Ana");
    seed_event(&db, "e1", "u1");

    let added = db
        .toggle_reaction(ReactionKind::Like, "e1", "u1", "Ana", "a.png")
        .unwrap();
    assert!(added);
    assert_eq!(db.reactions_for_event(ReactionKind::Like, "e1").unwrap().len(), 1);

    let added = db
        .toggle_reaction(ReactionKind::Like, "e1", "u1", "Ana", "a.png")
        .unwrap();
    assert!(!added);
    assert!(db.reactions_for_event(ReactionKind::Like, "e1").unwrap().is_empty());
}

#[test]
fn at_most_one_row_per_event_user_kind() {
    let (_dir, db) = open_db();
    seed_user(&db, "u1", "Ana");
    seed_event(&db, "e1", "u1");

    for _ in 0..5 {
        db.toggle_reaction(ReactionKind::Attend, "e1", "u1", "Ana", "a.png")
            .unwrap();
    }
    // Odd number of toggles: exactly one row
    db.toggle_reaction(ReactionKind::Attend, "e1", "u1", "Ana", "a.png")
        .unwrap();
    db.toggle_reaction(ReactionKind::Attend, "e1", "u1", "Ana", "a.png")
        .unwrap();
    let rows = db.reactions_for_event(ReactionKind::Attend, "e1").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, "u1");
}

#[test]
fn reaction_snapshot_is_not_updated_by_later_profile_edits() {
    let (_dir, db) = open_db();
    seed_user(&db, "u1", "Ana");
    seed_event(&db, "e1", "u1");

    db.toggle_reaction(ReactionKind::Like, "e1", "u1", "Ana", "old.png")
        .unwrap();
    db.update_avatar("u1", "new.png").unwrap();

    let rows = db.reactions_for_event(ReactionKind::Like, "e1").unwrap();
    assert_eq!(rows[0].avatar, "old.png");
}

#[test]
fn kinds_are_independent_memberships() {
    let (_dir, db) = open_db();
    seed_user(&db, "u1", "Ana");
    seed_event(&db, "e1", "u1");

    db.toggle_reaction(ReactionKind::Like, "e1", "u1", "Ana", "a.png")
        .unwrap();
    db.toggle_reaction(ReactionKind::Attend, "e1", "u1", "Ana", "a.png")
        .unwrap();
    db.toggle_reaction(ReactionKind::Like, "e1", "u1", "Ana", "a.png")
        .unwrap();

    assert!(db.reactions_for_event(ReactionKind::Like, "e1").unwrap().is_empty());
    assert_eq!(db.reactions_for_event(ReactionKind::Attend, "e1").unwrap().len(), 1);
}

#[test]
fn deleting_an_event_removes_its_reactions() {
    let (_dir, db) = open_db();
    seed_user(&db, "u1", "Ana");
    seed_user(&db, "u2", "Bruno");
    seed_event(&db, "e1", "u1");

    db.toggle_reaction(ReactionKind::Like, "e1", "u2", "Bruno", "b.png")
        .unwrap();
    assert!(db.delete_event("e1").unwrap());

    assert!(db.get_event("e1").unwrap().is_none());
    assert!(db.reactions_for_event(ReactionKind::Like, "e1").unwrap().is_empty());
}

#[test]
fn follow_is_unique_per_pair() {
    let (_dir, db) = open_db();
    seed_user(&db, "u1", "Ana");
    seed_user(&db, "u2", "Bruno");

    assert!(db.follow("u1", "u2").unwrap());
    assert!(!db.follow("u1", "u2").unwrap()); // second insert is a no-op
    assert!(db.is_following("u1", "u2").unwrap());
    assert_eq!(db.followers_of("u2").unwrap(), vec!["u1".to_string()]);

    assert!(db.unfollow("u1", "u2").unwrap());
    assert!(!db.unfollow("u1", "u2").unwrap());
    assert!(!db.is_following("u1", "u2").unwrap());
}

#[test]
fn notification_read_and_clear_flow() {
    let (_dir, db) = open_db();
    seed_user(&db, "u1", "Ana");
    seed_user(&db, "u2", "Bruno");

    db.insert_notification("n1", "u1", "u2", "Bruno", "like", Some("e1"))
        .unwrap();
    db.insert_notification("n2", "u1", "u2", "Bruno", "follow", None)
        .unwrap();
    assert_eq!(db.unread_notification_count("u1").unwrap(), 2);

    assert!(db.mark_notification_read("n1", "u1").unwrap());
    // Wrong recipient cannot touch the row
    assert!(!db.mark_notification_read("n2", "u2").unwrap());
    assert_eq!(db.unread_notification_count("u1").unwrap(), 1);

    // Clear deletes only read rows
    assert_eq!(db.clear_read_notifications("u1").unwrap(), 1);
    let remaining = db.notifications_for("u1", 50).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "n2");

    db.mark_all_notifications_read("u1").unwrap();
    assert_eq!(db.unread_notification_count("u1").unwrap(), 0);
}

#[test]
fn announcement_read_receipts_are_per_user() {
    let (_dir, db) = open_db();
    seed_user(&db, "u1", "Ana");
    seed_user(&db, "u2", "Bruno");

    db.insert_announcement("a1", "Aviso", "Se viene el festival").unwrap();
    db.mark_announcement_read("a1", "u1").unwrap();
    db.mark_announcement_read("a1", "u1").unwrap(); // idempotent

    let for_u1 = db.list_announcements("u1").unwrap();
    let for_u2 = db.list_announcements("u2").unwrap();
    assert!(for_u1[0].read);
    assert!(!for_u2[0].read);
}

#[test]
fn event_update_replaces_fields_wholesale() {
    let (_dir, db) = open_db();
    seed_user(&db, "u1", "Ana");
    seed_event(&db, "e1", "u1");

    let mut row = db.get_event("e1").unwrap().unwrap();
    row.title = "Festival grande".into();
    row.is_free = false;
    row.price_anticipada = Some(1500.0);
    row.price_general = Some(2500.0);
    assert!(db.update_event(&row).unwrap());

    let after = db.get_event("e1").unwrap().unwrap();
    assert_eq!(after.title, "Festival grande");
    assert_eq!(after.price_general, Some(2500.0));
    assert_eq!(after.organizer_name, "Ana");
}

#[test]
fn duplicate_email_insert_is_a_constraint_violation() {
    let (_dir, db) = open_db();
    seed_user(&db, "u1", "Ana");

    let err = db
        .create_profile(
            "u2",
            "u1@example.com",
            "argon2-hash",
            "Impostora",
            "https://example.com/avatar.png",
            None,
            None,
        )
        .unwrap_err();
    assert!(cartelera_db::is_constraint_violation(&err));
}
