//! End-to-end tests for the account lifecycle over the in-memory store.

use account_policy::{
    is_digest, AccountCandidate, AccountService, AccountStore, AccountUpdate, Config, Field,
    MemoryStore, PasswordHasher, PolicyError, StoreError,
};

fn service() -> AccountService<MemoryStore> {
    let config = Config::parse("[password]\nbcrypt_cost = 4\n").unwrap();
    AccountService::new(MemoryStore::new(), config.password.hasher().unwrap())
}

#[test]
fn short_username_rejected_without_hashing() {
    let service = service();

    let err = service
        .register(&AccountCandidate::new("ab@cd.com", "ab", "Abc123!"))
        .unwrap_err();

    assert!(err.is_client_error());
    assert_eq!(
        err.to_string(),
        "Username must be at least 3 characters but no more than 15"
    );
    match err {
        PolicyError::Field(e) => assert_eq!(e.field, Field::Username),
        other => panic!("expected field error, got {other:?}"),
    }
    assert!(service.store().is_empty());
}

#[test]
fn valid_candidate_stored_with_digest() {
    let service = service();

    let account = service
        .register(&AccountCandidate::new("valid@example.com", "validuser", "Abc123!"))
        .unwrap();

    let stored = service.store().get_by_id(account.id).unwrap().unwrap();
    assert_ne!(stored.password, "Abc123!");
    assert!(is_digest(&stored.password));
    assert!(service.hasher().verify("Abc123!", &stored.password));
}

#[test]
fn unrelated_update_keeps_digest() {
    let service = service();
    let account = service
        .register(&AccountCandidate::new("valid@example.com", "validuser", "Abc123!"))
        .unwrap();

    let updated = service
        .update(account.id, &AccountUpdate::new().email("New@Example.com"))
        .unwrap();
    assert_eq!(updated.email, "new@example.com");
    assert_eq!(updated.password, account.password);

    // Saving the record back unchanged must not touch the digest either.
    let resaved = service
        .update(
            account.id,
            &AccountUpdate::new()
                .email(updated.email.clone())
                .username(updated.username.clone())
                .password(updated.password.clone()),
        )
        .unwrap();
    assert_eq!(resaved.password, account.password);

    assert!(service.authenticate("new@example.com", "Abc123!").is_ok());
}

#[test]
fn duplicate_email_is_a_conflict() {
    let service = service();
    service
        .register(&AccountCandidate::new("valid@example.com", "validuser", "Abc123!"))
        .unwrap();

    let err = service
        .register(&AccountCandidate::new("VALID@example.com", "another", "Abc123!"))
        .unwrap_err();

    assert!(matches!(err, PolicyError::Store(StoreError::DuplicateEmail)));
    assert!(err.is_client_error());
    assert_eq!(service.store().len(), 1);
}

#[test]
fn login_failures_use_generic_message() {
    let service = service();
    service
        .register(&AccountCandidate::new("valid@example.com", "validuser", "Abc123!"))
        .unwrap();

    for (identifier, password) in [
        ("validuser", "wrong"),
        ("valid@example.com", "Abc123?"),
        ("ghost", "Abc123!"),
        ("ghost@example.com", "Abc123!"),
    ] {
        let err = service.authenticate(identifier, password).unwrap_err();
        assert_eq!(err.to_string(), "invalid credentials");
    }
}

#[test]
fn external_store_receives_only_digests() {
    let service = service();

    let new_account = service
        .prepare_new(&AccountCandidate::new("valid@example.com", "validuser", "Abc123!"))
        .unwrap();
    assert_ne!(new_account.password_digest(), "Abc123!");

    let store = MemoryStore::new();
    let account = store.create(new_account).unwrap();
    assert!(PasswordHasher::default().verify("Abc123!", &account.password));
}
