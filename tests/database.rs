//!
//! Tests over a live sqlite database.
//!
use std::path::Path;

use chatstore::entry::{FaceRecord, FaceTagRecord, MessageKind, MessageRecord, NudgeRecord};
use chatstore::{Configuration, Loader, Order, SessionFactory};

fn face_md5(index: u64) -> String {
    format!("{:032x}", (index as u128 + 1).wrapping_mul(0x9e3779b97f4a7c15))
}

fn build_factory(dir: &Path) -> SessionFactory {
    let loader = Loader::new(
        dir.join("chatstore.properties"),
        format!(
            "connection.url=jdbc:sqlite:{}\n",
            dir.join("chatstore.db").display()
        ),
    );
    let mut configuration = Configuration::from_loader(&loader).unwrap();
    configuration
        .entity::<FaceRecord>()
        .entity::<FaceTagRecord>()
        .entity::<MessageRecord>()
        .entity::<NudgeRecord>();
    configuration.build().unwrap()
}

fn insert_fixtures(factory: &SessionFactory) {
    let session = factory.open_session().unwrap();
    let transaction = session.begin_transaction().unwrap();
    let mut faces = Vec::new();
    for index in 0..100u64 {
        let md5 = face_md5(index);
        faces.push(FaceRecord {
            md5: md5.clone(),
            code: "{}".to_string(),
            content: index.to_string(),
            url: format!("https://127.0.0.1/{}", index),
            height: index as i32,
            width: index as i32,
            disable: false,
        });

        let message = MessageRecord::new(
            index as i64 * 10,
            index as i64 * 100,
            index as i64 * 1000,
            index.to_string(),
            index.to_string(),
            MessageKind::Group,
            md5,
        );
        session.save(&message).unwrap();
    }
    let refs: Vec<&FaceRecord> = faces.iter().collect();
    session.save_batch(&refs).unwrap();
    transaction.commit().unwrap();
}

#[test]
fn settings_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.properties");
    let default_text = "connection.url=jdbc:sqlite::memory:\n";

    assert!(!path.exists());
    Configuration::from_loader(&Loader::new(&path, default_text)).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), default_text);

    // a second build against the same path keeps pre-existing content
    let custom = "connection.url=jdbc:sqlite::memory:\npool.connection_timeout=2\n";
    std::fs::write(&path, custom).unwrap();
    Configuration::from_loader(&Loader::new(&path, default_text)).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), custom);
}

#[test]
fn single_file_backend_pool_is_serialized() {
    let dir = tempfile::tempdir().unwrap();
    let factory = build_factory(dir.path());
    assert_eq!(factory.settings().pool_min(), 1);
    assert_eq!(factory.settings().pool_max(), 1);
}

#[test]
fn rand_stays_in_unit_interval() {
    let dir = tempfile::tempdir().unwrap();
    let factory = build_factory(dir.path());
    let session = factory.open_session().unwrap();
    for _ in 0..1000 {
        let num: f64 = session.select_scalar(|builder| builder.rand()).unwrap();
        assert!(num >= 0.0, "{} < 0.0", num);
        assert!(num < 1.0, "{} >= 1.0", num);
    }
}

#[test]
fn dice_stays_in_closed_range() {
    let dir = tempfile::tempdir().unwrap();
    let factory = build_factory(dir.path());
    let session = factory.open_session().unwrap();
    for _ in 0..1000 {
        let num: i64 = session
            .select_scalar(|builder| builder.dice(builder.literal(1000)))
            .unwrap();
        assert!(num >= 0, "{} < 0", num);
        assert!(num <= 1000, "{} > 1000", num);
    }
}

#[test]
fn order_by_rand_draws_three_distinct_faces() {
    let dir = tempfile::tempdir().unwrap();
    let factory = build_factory(dir.path());
    insert_fixtures(&factory);
    let session = factory.open_session().unwrap();

    let all = session
        .select_query::<FaceRecord, _>(|_, _| {})
        .fetch()
        .unwrap();
    assert_eq!(all.len(), 100);

    for _ in 0..2 {
        let faces = session
            .select_query::<FaceRecord, _>(|builder, query| {
                query.order_by(builder.rand(), Order::Asc);
                query.limit(3);
            })
            .fetch()
            .unwrap();
        assert_eq!(faces.len(), 3);
        let mut md5s: Vec<&str> = faces.iter().map(|f| f.md5.as_str()).collect();
        md5s.sort_unstable();
        md5s.dedup();
        assert_eq!(md5s.len(), 3);
        // repeated draws need not agree on order, so nothing else is asserted
    }
}

#[test]
fn dice_bounded_by_max_id_predicate() {
    let dir = tempfile::tempdir().unwrap();
    let factory = build_factory(dir.path());
    insert_fixtures(&factory);
    let session = factory.open_session().unwrap();

    let max_id: i64 = session
        .select_query::<MessageRecord, _>(|builder, query| {
            let root = query.root();
            query.select(builder.max(root.get::<i64>("id")));
        })
        .fetch_scalar()
        .unwrap();
    assert!(max_id >= 100);

    let messages = session
        .select_query::<MessageRecord, _>(|builder, query| {
            let root = query.root();
            let id = root.get::<i64>("id");
            let max =
                builder.scalar_subquery::<MessageRecord, _, _>(|m| builder.max(m.get("id")));
            query.filter(builder.ge(id, builder.dice(max)));
            query.limit(3);
        })
        .fetch()
        .unwrap();
    assert!(messages.len() <= 3);
    for message in &messages {
        assert!(message.id >= 1);
        assert!(message.id <= max_id);
    }
}

#[test]
fn recall_flag_flips_without_touching_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let factory = build_factory(dir.path());
    insert_fixtures(&factory);
    let session = factory.open_session().unwrap();

    let transaction = session.begin_transaction().unwrap();
    let affected = session
        .update_query::<MessageRecord, _>(|builder, update| {
            let root = update.root();
            update.set("recall", true);
            update.filter(builder.eq(root.get::<i64>("id"), 1));
        })
        .execute()
        .unwrap();
    transaction.commit().unwrap();
    assert_eq!(affected, 1);

    let recalled = session
        .select_query::<MessageRecord, _>(|builder, query| {
            let root = query.root();
            query.filter(builder.eq(root.get::<i64>("id"), 1));
        })
        .first()
        .unwrap()
        .unwrap();
    assert!(recalled.recall);
    assert_eq!(recalled.bot, 0);
}

#[test]
fn face_tags_are_looked_up_by_md5() {
    let dir = tempfile::tempdir().unwrap();
    let factory = build_factory(dir.path());
    insert_fixtures(&factory);
    let session = factory.open_session().unwrap();

    let face = session
        .select_query::<FaceRecord, _>(|_, query| {
            query.limit(1);
        })
        .first()
        .unwrap()
        .unwrap();
    assert!(face.content_json().unwrap().is_object());

    let transaction = session.begin_transaction().unwrap();
    session
        .merge(&FaceTagRecord::new(face.md5.as_str(), "test"))
        .unwrap();
    transaction.commit().unwrap();

    let tags = face.tags(&session).unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].md5, face.md5);
    assert_eq!(tags[0].tag, "test");

    // merge replaces the row with the same natural key
    let transaction = session.begin_transaction().unwrap();
    let mut disabled = face.clone();
    disabled.disable = true;
    session.merge(&disabled).unwrap();
    transaction.commit().unwrap();

    let reloaded = session
        .select_query::<FaceRecord, _>(|builder, query| {
            let root = query.root();
            let md5 = root.get::<String>("md5");
            let wanted = builder.text(&face.md5);
            query.filter(builder.eq(md5, wanted));
        })
        .first()
        .unwrap()
        .unwrap();
    assert!(reloaded.disable);
}

#[test]
fn nudge_log_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let factory = build_factory(dir.path());
    let session = factory.open_session().unwrap();

    let transaction = session.begin_transaction().unwrap();
    session
        .save(&NudgeRecord::new(1, 2, 3, 4, "poked", ""))
        .unwrap();
    transaction.commit().unwrap();
    assert_eq!(session.last_insert_id(), 1);

    let nudge = session
        .select_query::<NudgeRecord, _>(|_, query| {
            query.limit(1);
        })
        .first()
        .unwrap()
        .unwrap();
    assert_eq!(nudge.from_id, 2);
    assert_eq!(nudge.action, "poked");
}

#[test]
fn dropped_transaction_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let factory = build_factory(dir.path());
    let session = factory.open_session().unwrap();

    {
        let _transaction = session.begin_transaction().unwrap();
        session
            .save(&NudgeRecord::new(1, 2, 3, 4, "poked", ""))
            .unwrap();
        // dropped without commit
    }

    let nudge = session
        .select_query::<NudgeRecord, _>(|_, query| {
            query.limit(1);
        })
        .first()
        .unwrap();
    assert!(nudge.is_none());
}
