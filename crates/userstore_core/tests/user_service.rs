use userstore_core::{InMemoryUserRepository, User, UserService, UserServiceError};
use uuid::Uuid;

fn service() -> UserService<InMemoryUserRepository> {
    UserService::new(InMemoryUserRepository::new())
}

#[test]
fn create_then_get_by_raw_id_string() {
    let service = service();
    let created = service
        .create_user(&User::new("Fake Name", "fake@email.com", ["admin", "master"]))
        .unwrap();
    let id = created.id.unwrap().to_string();

    let loaded = service.get_user(&id).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn duplicate_create_is_reported_as_duplicate_user() {
    let service = service();
    service
        .create_user(&User::new("Fake Name", "fake@email.com", ["admin"]))
        .unwrap();
    let err = service
        .create_user(&User::new("Name Fake", "fake@email.com", ["master"]))
        .unwrap_err();
    assert!(
        matches!(err, UserServiceError::DuplicateUser(ref key) if key.email() == "fake@email.com")
    );
}

#[test]
fn unparseable_id_reads_as_not_found() {
    let service = service();
    let err = service.get_user("not_existing_id").unwrap_err();
    assert!(matches!(err, UserServiceError::UserNotFound(ref id) if id == "not_existing_id"));
}

#[test]
fn delete_tolerates_missing_users() {
    let service = service();
    // Unknown uuid and unparseable id both resolve to "already absent".
    service.delete_user(&Uuid::new_v4().to_string()).unwrap();
    service.delete_user("not_existing_id").unwrap();
}

#[test]
fn delete_removes_existing_user() {
    let service = service();
    let created = service
        .create_user(&User::new("Fake Name", "fake@email.com", ["admin"]))
        .unwrap();
    let id = created.id.unwrap().to_string();

    service.delete_user(&id).unwrap();
    assert!(matches!(
        service.get_user(&id).unwrap_err(),
        UserServiceError::UserNotFound(_)
    ));
}

#[test]
fn update_rejects_unique_key_change() {
    let service = service();
    let created = service
        .create_user(&User::new("Fake Name", "fake@email.com", ["admin"]))
        .unwrap();
    let id = created.id.unwrap().to_string();

    let renamed_key = User::new("Fake Name", "other@email.com", ["admin"]);
    let err = service.update_user(&id, &renamed_key).unwrap_err();
    assert!(
        matches!(err, UserServiceError::UniqueKeyChange(ref key) if key.email() == "other@email.com")
    );

    // The stored record is untouched.
    assert_eq!(service.get_user(&id).unwrap().email, "fake@email.com");
}

#[test]
fn update_pins_the_stored_id() {
    let service = service();
    let created = service
        .create_user(&User::new("Fake Name", "fake@email.com", ["admin"]))
        .unwrap();
    let id = created.id.unwrap();

    let mut payload = User::new("new_Name", "fake@email.com", ["master"]);
    payload.id = Some(Uuid::new_v4());
    let updated = service.update_user(&id.to_string(), &payload).unwrap();

    assert_eq!(updated.id, Some(id));
    assert_eq!(updated.name, "new_Name");
    assert_eq!(service.get_user(&id.to_string()).unwrap(), updated);
}

#[test]
fn update_unknown_id_returns_not_found() {
    let service = service();
    let payload = User::new("Fake Name", "fake@email.com", ["admin"]);
    let missing = Uuid::new_v4().to_string();
    let err = service.update_user(&missing, &payload).unwrap_err();
    assert!(matches!(err, UserServiceError::UserNotFound(ref id) if id == &missing));
}

#[test]
fn list_and_search_pass_through() {
    let service = service();
    let created = service
        .create_user(&User::new("name", "email1@example.com", ["admin"]))
        .unwrap();
    service
        .create_user(&User::new("other", "email2@example.com", ["master"]))
        .unwrap();

    assert_eq!(service.list_users().unwrap().len(), 2);
    assert_eq!(service.find_users_by_name("name").unwrap(), vec![created]);
}

#[test]
fn invalid_payload_is_reported_as_validation() {
    let service = service();
    let err = service
        .create_user(&User::new("Fake Name", "broken", ["admin"]))
        .unwrap_err();
    assert!(matches!(err, UserServiceError::Validation(_)));
}
