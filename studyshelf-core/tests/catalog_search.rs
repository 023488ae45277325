use std::fs;
use std::path::PathBuf;

use studyshelf_core::{filter_items, filter_roadmap, Catalog, CoreError, Subject};

fn write_data_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("books.json"),
        r#"{"books":[
            {"title":"Calculus","author":"Michael Spivak","file":"public/books/calculus"},
            {"title":"Classical Mechanics","author":"John Taylor","file":"public/books/mechanics","category":"Physics"}
        ]}"#,
    )
    .unwrap();
    fs::write(
        dir.join("videos.json"),
        r#"{"videos":[
            {"title":"Essence of linear algebra","channel":"3Blue1Brown","url":"https://example.org/la","category":"Mathematics"}
        ]}"#,
    )
    .unwrap();
    fs::write(
        dir.join("physics.json"),
        r#"{"topics":[
            {"name":"Mechanics","children":[{"name":"Newton's laws","note":"Force and motion"},{"name":"Energy"}]},
            {"name":"Optics"}
        ]}"#,
    )
    .unwrap();
    dir
}

#[test]
fn load_and_filter_physics_catalog() {
    let dir = write_data_dir("studyshelf_catalog_physics");

    let catalog = Catalog::load(&dir, Subject::Physics).unwrap();
    assert_eq!(catalog.subject, Subject::Physics);
    assert_eq!(catalog.books.len(), 2);
    assert_eq!(catalog.videos.len(), 1);
    assert_eq!(catalog.topics.len(), 2);

    let physics_books = filter_items("physics", &catalog.books);
    assert_eq!(physics_books.len(), 1);
    assert_eq!(physics_books[0].title, "Classical Mechanics");

    let motion = filter_roadmap("MOTION", &catalog.topics);
    assert_eq!(motion.len(), 1);
    assert_eq!(motion[0].children.as_ref().unwrap().len(), 1);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_roadmap_file_fails_whole_load() {
    let dir = write_data_dir("studyshelf_catalog_missing_cs");

    let err = Catalog::load(&dir, Subject::Cs).unwrap_err();
    assert!(matches!(err, CoreError::Io { .. }));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn malformed_json_is_parse_error() {
    let dir = write_data_dir("studyshelf_catalog_malformed");
    fs::write(dir.join("videos.json"), "{ not json").unwrap();

    let err = Catalog::load(&dir, Subject::Physics).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }));

    let _ = fs::remove_dir_all(&dir);
}
