use std::sync::Arc;
use userstore_core::{InMemoryUserRepository, RepoError, User, UserRepository};
use uuid::Uuid;

#[test]
fn create_assigns_id_and_get_roundtrips() {
    let repo = InMemoryUserRepository::new();
    let user = User::new("Fake Name", "fake@email.com", ["admin", "master"]);

    let created = repo.create_user(&user).unwrap();
    let id = created.id.unwrap();

    let loaded = repo.get_user(id).unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.name, "Fake Name");
    assert_eq!(loaded.roles, vec!["admin".to_string(), "master".to_string()]);
}

#[test]
fn create_rejects_duplicate_email() {
    let repo = InMemoryUserRepository::new();
    let first = User::new("Fake Name", "fake@email.com", ["admin", "master"]);
    let second = User::new("Name Fake", "fake@email.com", ["master"]);

    repo.create_user(&first).unwrap();
    let err = repo.create_user(&second).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateKey(ref key) if key.email() == "fake@email.com"));
    assert_eq!(repo.list_users().unwrap().len(), 1);
}

#[test]
fn list_returns_all_users() {
    let repo = InMemoryUserRepository::new();
    repo.create_user(&User::new("Fake Name", "email1@example.com", ["admin", "master"]))
        .unwrap();
    repo.create_user(&User::new("Name Fake", "email2@example.com", ["master"]))
        .unwrap();

    let all = repo.list_users().unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|user| user.email == "email1@example.com"));
    assert!(all.iter().any(|user| user.email == "email2@example.com"));
}

#[test]
fn get_unknown_id_returns_not_found() {
    let repo = InMemoryUserRepository::new();
    let missing = Uuid::new_v4();
    let err = repo.get_user(missing).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
}

#[test]
fn delete_removes_user_and_is_idempotent() {
    let repo = InMemoryUserRepository::new();
    let created = repo
        .create_user(&User::new("Fake Name", "fake@email.com", ["admin"]))
        .unwrap();
    let id = created.id.unwrap();

    repo.delete_user(&created).unwrap();
    assert!(matches!(repo.get_user(id), Err(RepoError::NotFound(_))));

    // Deleting again is a tolerated no-op.
    repo.delete_user(&created).unwrap();
}

#[test]
fn update_replaces_stored_user() {
    let repo = InMemoryUserRepository::new();
    let mut created = repo
        .create_user(&User::new("Fake Name", "fake@email.com", ["admin"]))
        .unwrap();

    created.name = "new_Name".to_string();
    created.roles = vec!["master".to_string()];
    let updated = repo.update_user(&created).unwrap();
    assert_eq!(updated, created);

    let loaded = repo.get_user(created.id.unwrap()).unwrap();
    assert_eq!(loaded.name, "new_Name");
    assert_eq!(loaded.roles, vec!["master".to_string()]);
}

#[test]
fn update_requires_persisted_id() {
    let repo = InMemoryUserRepository::new();
    let unpersisted = User::new("Fake Name", "fake@email.com", ["admin"]);
    let err = repo.update_user(&unpersisted).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn update_unknown_id_returns_not_found() {
    let repo = InMemoryUserRepository::new();
    let mut ghost = User::new("Fake Name", "fake@email.com", ["admin"]);
    ghost.id = Some(Uuid::new_v4());
    let err = repo.update_user(&ghost).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn update_rejects_email_taken_by_another_user() {
    let repo = InMemoryUserRepository::new();
    repo.create_user(&User::new("Fake Name", "taken@email.com", ["admin"]))
        .unwrap();
    let mut other = repo
        .create_user(&User::new("Name Fake", "free@email.com", ["master"]))
        .unwrap();

    other.email = "taken@email.com".to_string();
    let err = repo.update_user(&other).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateKey(ref key) if key.email() == "taken@email.com"));
}

#[test]
fn find_users_by_name_matches_exactly() {
    let repo = InMemoryUserRepository::new();
    let created = repo
        .create_user(&User::new("name", "fake@email.com", ["admin", "master"]))
        .unwrap();
    repo.create_user(&User::new("other", "other@email.com", ["master"]))
        .unwrap();

    let found = repo.find_users_by_name("name").unwrap();
    assert_eq!(found, vec![created]);
    assert!(repo.find_users_by_name("Name").unwrap().is_empty());
}

#[test]
fn caller_changes_after_create_do_not_reach_the_store() {
    let repo = InMemoryUserRepository::new();
    let mut input = User::new("Fake Name", "fake@email.com", ["admin", "master"]);
    let mut created = repo.create_user(&input).unwrap();
    let id = created.id.unwrap();

    input.name = "new name".to_string();
    created.name = "new name".to_string();

    let stored = repo.get_user(id).unwrap();
    assert_eq!(stored.name, "Fake Name");
}

#[test]
fn caller_changes_after_update_do_not_reach_the_store() {
    let repo = InMemoryUserRepository::new();
    let mut created = repo
        .create_user(&User::new("Fake Name", "fake@email.com", ["admin"]))
        .unwrap();
    let id = created.id.unwrap();

    created.name = "new_Name".to_string();
    let mut updated = repo.update_user(&created).unwrap();

    created.name = "other name".to_string();
    updated.name = "other name".to_string();

    let stored = repo.get_user(id).unwrap();
    assert_eq!(stored.name, "new_Name");
}

#[test]
fn caller_changes_after_reads_do_not_reach_the_store() {
    let repo = InMemoryUserRepository::new();
    let created = repo
        .create_user(&User::new("name", "fake@email.com", ["admin"]))
        .unwrap();
    let id = created.id.unwrap();

    let mut from_get = repo.get_user(id).unwrap();
    from_get.name = "new name".to_string();

    let mut from_list = repo.list_users().unwrap();
    from_list[0].name = "new name".to_string();

    let mut from_search = repo.find_users_by_name("name").unwrap();
    from_search[0].name = "new name".to_string();

    assert_eq!(repo.get_user(id).unwrap().name, "name");
}

#[test]
fn validation_failure_blocks_create_and_update() {
    let repo = InMemoryUserRepository::new();
    let invalid = User::new("Fake Name", "not-an-email", ["admin"]);
    assert!(matches!(
        repo.create_user(&invalid).unwrap_err(),
        RepoError::Validation(_)
    ));

    let mut created = repo
        .create_user(&User::new("Fake Name", "fake@email.com", ["admin"]))
        .unwrap();
    created.roles.clear();
    assert!(matches!(
        repo.update_user(&created).unwrap_err(),
        RepoError::Validation(_)
    ));
}

#[test]
fn concurrent_creates_with_same_email_keep_exactly_one_user() {
    let repo = Arc::new(InMemoryUserRepository::new());
    let mut handles = Vec::new();

    for num in 0..100 {
        let repo = Arc::clone(&repo);
        handles.push(std::thread::spawn(move || {
            let user = User::new(
                format!("userName{num}"),
                "same_email@for_every.one",
                [num.to_string()],
            );
            repo.create_user(&user).is_ok()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.join().unwrap() {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(repo.list_users().unwrap().len(), 1);
}
