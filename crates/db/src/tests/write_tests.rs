use super::helpers::{ids, open_in};
use anyhow::Result;
use tempfile::tempdir;

// --------------------- add ---------------------

#[test]
fn add_then_get() -> Result<()> {
    let dir = tempdir()?;
    let mut db = open_in(dir.path());

    db.add(7, "Alice", 12.5)?;
    let rec = db.get(7).unwrap();
    assert_eq!(rec.id, 7);
    assert_eq!(rec.name(), "Alice");
    assert_eq!(rec.value, 12.5);
    assert_eq!(db.len(), 1);
    Ok(())
}

#[test]
fn add_rejects_negative_id() -> Result<()> {
    let dir = tempdir()?;
    let mut db = open_in(dir.path());

    let err = db.add(-3, "x", 1.0).unwrap_err();
    assert!(err.to_string().contains("non-negative"));
    assert!(db.is_empty());
    Ok(())
}

#[test]
fn add_rejects_duplicate_and_keeps_original() -> Result<()> {
    let dir = tempdir()?;
    let mut db = open_in(dir.path());

    db.add(1, "first", 1.0)?;
    let err = db.add(1, "second", 2.0).unwrap_err();
    assert!(err.to_string().contains("duplicate"));
    assert_eq!(db.get(1).unwrap().name(), "first");
    assert_eq!(db.len(), 1);
    Ok(())
}

// --------------------- del ---------------------

#[test]
fn del_existing_and_missing() -> Result<()> {
    let dir = tempdir()?;
    let mut db = open_in(dir.path());

    for id in [5, 1, 9, 3] {
        db.add(id, "r", id as f64)?;
    }
    assert_eq!(ids(&db), vec![1, 3, 5, 9]);

    assert!(db.del(1));
    assert_eq!(ids(&db), vec![3, 5, 9]);
    assert!(!db.del(1));
    assert!(!db.del(-1));
    assert_eq!(db.len(), 3);
    Ok(())
}

// --------------------- update ---------------------

#[test]
fn update_replaces_name_and_value() -> Result<()> {
    let dir = tempdir()?;
    let mut db = open_in(dir.path());

    db.add(4, "old", 1.0)?;
    db.add(8, "other", 2.0)?;
    db.update(4, "new", 99.0)?;

    let rec = db.get(4).unwrap();
    assert_eq!(rec.name(), "new");
    assert_eq!(rec.value, 99.0);
    assert_eq!(rec.id, 4);
    assert_eq!(ids(&db), vec![4, 8]);
    Ok(())
}

#[test]
fn update_missing_record_fails() -> Result<()> {
    let dir = tempdir()?;
    let mut db = open_in(dir.path());

    let err = db.update(3, "x", 1.0).unwrap_err();
    assert!(err.to_string().contains("not found"));
    assert!(db.get(3).is_none());
    Ok(())
}

// --------------------- bulk_add ---------------------

#[test]
fn bulk_add_into_empty_db_starts_at_zero() -> Result<()> {
    let dir = tempdir()?;
    let mut db = open_in(dir.path());

    assert_eq!(db.bulk_add(100)?, 100);
    assert_eq!(db.len(), 100);
    assert_eq!(ids(&db), (0..100).collect::<Vec<_>>());

    let rec = db.get(42).unwrap();
    assert_eq!(rec.name(), "RandomName_42");
    assert!((0.0..1000.0).contains(&rec.value));
    Ok(())
}

#[test]
fn bulk_add_skips_existing_ids() -> Result<()> {
    let dir = tempdir()?;
    let mut db = open_in(dir.path());

    for id in 0..50 {
        db.add(id, "manual", 0.0)?;
    }
    assert_eq!(db.bulk_add(500)?, 500);
    assert_eq!(db.len(), 550);

    // manual records were never overwritten
    for id in 0..50 {
        assert_eq!(db.get(id).unwrap().name(), "manual");
    }
    let all = ids(&db);
    assert!(all.windows(2).all(|w| w[0] < w[1]));
    Ok(())
}

#[test]
fn bulk_add_zero_is_an_error() -> Result<()> {
    let dir = tempdir()?;
    let mut db = open_in(dir.path());
    assert!(db.bulk_add(0).is_err());
    Ok(())
}

#[test]
fn bulk_add_with_record_at_id_limit() -> Result<()> {
    let dir = tempdir()?;
    let mut db = open_in(dir.path());

    db.add(i32::MAX, "last", 0.0)?;
    // the single record makes the random start land in 0..5
    assert_eq!(db.bulk_add(3)?, 3);
    assert_eq!(db.len(), 4);
    Ok(())
}
