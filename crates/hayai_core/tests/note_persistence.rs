use hayai_core::db::open_db;
use hayai_core::{Note, NotePatch, NoteService, SqliteNoteRepository, StoreConfig};
use std::path::Path;

#[test]
fn reopening_database_reproduces_same_notes() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::in_dir(dir.path());
    config.validate().unwrap();

    let before = {
        let mut conn = open_db(&config.db_path).unwrap();
        let mut service = NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap());
        let a = service.create_note("A", "alpha").unwrap();
        let b = service.create_note("B", "beta").unwrap();
        let c = service.create_note("C", "gamma").unwrap();
        let d = service.create_note("D", "delta").unwrap();
        service
            .update_note(
                b.id,
                NotePatch {
                    title: Some("B2".to_string()),
                    content: None,
                },
            )
            .unwrap();
        service.delete_note(a.id).unwrap();
        service.delete_notes(&[c.id, d.id]).unwrap();
        service.create_note("E", "epsilon").unwrap();
        service.list_notes().unwrap()
    };

    let after = list_from_disk(&config.db_path);
    assert_eq!(before, after);
    let titles: Vec<_> = after.iter().map(|note| note.title.as_str()).collect();
    assert_eq!(titles, vec!["B2", "E"]);
}

#[test]
fn every_mutation_is_durable_before_returning() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.sqlite3");

    let mut conn = open_db(&path).unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap());
    let created = service.create_note("Live", "write").unwrap();

    // Second connection sees the row while the first is still open.
    assert_eq!(list_from_disk(&path), vec![created.clone()]);

    service
        .replace_note(created.id, "Live", "rewrite")
        .unwrap();
    assert_eq!(list_from_disk(&path)[0].content, "rewrite");

    service.delete_note(created.id).unwrap();
    assert!(list_from_disk(&path).is_empty());
}

fn list_from_disk(path: &Path) -> Vec<Note> {
    let mut conn = open_db(path).unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap());
    service.list_notes().unwrap()
}
