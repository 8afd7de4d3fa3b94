use listdist_core::db::open_db_in_memory;
use listdist_core::model::assigned_list::ListDraft;
use listdist_core::model::contact::ContactRecord;
use listdist_core::repo::list_repo::{ListRepository, SqliteListRepository};
use listdist_core::repo::RepoError;
use rusqlite::Connection;
use uuid::Uuid;

fn record(first_name: &str, phone: &str) -> ContactRecord {
    ContactRecord::new(first_name, phone, "")
}

fn draft(name: &str, items: Vec<ContactRecord>) -> ListDraft {
    ListDraft {
        agent_id: Uuid::new_v4(),
        agent_name: name.to_string(),
        items,
    }
}

#[test]
fn replace_persists_lists_in_draft_order_with_shared_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteListRepository::try_new(&conn).unwrap();
    let drafts = vec![
        draft("Ada", vec![record("A", "1"), record("C", "3")]),
        draft("Grace", vec![record("B", "2")]),
    ];

    let stored = repo.replace_lists(&drafts).unwrap();

    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].position, 0);
    assert_eq!(stored[1].position, 1);
    assert_eq!(stored[0].assigned_at, stored[1].assigned_at);
    assert_eq!(stored[0].items, drafts[0].items);

    let listed = repo.list_lists().unwrap();
    assert_eq!(listed, stored);
    assert_eq!(repo.count_items().unwrap(), 3);
}

#[test]
fn replace_discards_previous_distribution_entirely() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteListRepository::try_new(&conn).unwrap();
    let first = vec![
        draft("Ada", vec![record("A", "1")]),
        draft("Grace", vec![record("B", "2")]),
    ];
    repo.replace_lists(&first).unwrap();

    let second = vec![draft("Linus", vec![record("Z", "9")])];
    repo.replace_lists(&second).unwrap();

    let listed = repo.list_lists().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].agent_name, "Linus");
    assert_eq!(repo.count_items().unwrap(), 1);
    assert!(repo
        .get_list_for_agent(first[0].agent_id)
        .unwrap()
        .is_none());
}

#[test]
fn failed_replace_keeps_previous_distribution() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteListRepository::try_new(&conn).unwrap();
    let original = vec![draft("Ada", vec![record("A", "1"), record("B", "2")])];
    let stored = repo.replace_lists(&original).unwrap();

    // Second list carries a blank phone, which the store refuses.
    let broken = vec![
        draft("Grace", vec![record("C", "3")]),
        draft("Linus", vec![record("D", "  ")]),
    ];
    let err = repo.replace_lists(&broken).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));

    assert_eq!(repo.list_lists().unwrap(), stored);
    assert_eq!(repo.count_items().unwrap(), 2);
}

#[test]
fn get_list_for_agent_returns_only_that_agents_items() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteListRepository::try_new(&conn).unwrap();
    let drafts = vec![
        draft("Ada", vec![record("A", "1"), record("C", "3")]),
        draft("Grace", vec![record("B", "2")]),
    ];
    repo.replace_lists(&drafts).unwrap();

    let grace = repo
        .get_list_for_agent(drafts[1].agent_id)
        .unwrap()
        .unwrap();
    assert_eq!(grace.agent_name, "Grace");
    assert_eq!(grace.items, vec![record("B", "2")]);
    assert!(repo.get_list_for_agent(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn empty_lists_are_stored_and_returned() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteListRepository::try_new(&conn).unwrap();
    let drafts = vec![draft("Ada", vec![record("A", "1")]), draft("Grace", vec![])];

    repo.replace_lists(&drafts).unwrap();

    let listed = repo.list_lists().unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed[1].items.is_empty());
}

#[test]
fn item_order_survives_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lists.sqlite3");
    let items: Vec<ContactRecord> = (0..12)
        .map(|index| ContactRecord::new(format!("Name{index}"), format!("555{index}"), "n"))
        .collect();
    let drafts = vec![draft("Ada", items.clone())];

    {
        let conn = listdist_core::db::open_db(&path).unwrap();
        let repo = SqliteListRepository::try_new(&conn).unwrap();
        repo.replace_lists(&drafts).unwrap();
    }

    let conn = listdist_core::db::open_db(&path).unwrap();
    let repo = SqliteListRepository::try_new(&conn).unwrap();
    let listed = repo.list_lists().unwrap();
    assert_eq!(listed[0].items, items);
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteListRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::UninitializedConnection { .. }));
}
