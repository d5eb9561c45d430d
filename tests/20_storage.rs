mod common;

use anyhow::Result;

use bookstore::database::models::{
    BookCreationRequest, BookListingRequest, BookModificationRequest, UserModificationRequest,
};
use bookstore::database::{BookQuery, StoreError};
use bookstore::validator::{validate_book_creation, validate_user_creation, ValidatorError};

fn book(title: &str, price: i64) -> BookCreationRequest {
    BookCreationRequest {
        title: title.to_string(),
        description: format!("About {}", title),
        price,
        image_url: "https://example.com/cover.png".to_string(),
    }
}

#[tokio::test]
async fn created_user_round_trips_and_username_is_lowercased() -> Result<()> {
    let storage = common::storage().await?;
    let created = common::seed_user(&storage, "Alice", "secret1", "Alice A", false).await?;
    assert_eq!(created.username, "alice");

    let by_id = storage.user_by_id(created.id).await?;
    assert_eq!(by_id.as_ref(), Some(&created));

    let by_name = storage.user_by_username("ALICE").await?;
    assert_eq!(by_name, Some(created));
    Ok(())
}

#[tokio::test]
async fn user_patch_leaves_absent_fields_alone() -> Result<()> {
    let storage = common::storage().await?;
    let alice = common::seed_user(&storage, "alice", "secret1", "Alice A", false).await?;

    let patch = UserModificationRequest {
        pseudonym: Some("Alice B".to_string()),
        ..Default::default()
    };
    let updated = storage.update_user(alice.id, &patch).await?.expect("user exists");
    assert_eq!(updated.username, "alice");
    assert_eq!(updated.pseudonym, "Alice B");
    assert!(!updated.is_admin);

    // Password untouched by a patch without one
    storage.check_password("alice", "secret1").await?;

    let patch = UserModificationRequest {
        password: Some("another1".to_string()),
        ..Default::default()
    };
    storage.update_user(alice.id, &patch).await?;
    assert!(matches!(
        storage.check_password("alice", "secret1").await,
        Err(StoreError::InvalidCredentials)
    ));
    storage.check_password("alice", "another1").await?;

    assert!(storage.update_user(9999, &patch).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn check_password_fails_the_same_way_for_unknown_users() -> Result<()> {
    let storage = common::storage().await?;
    common::seed_user(&storage, "alice", "secret1", "Alice A", false).await?;

    assert!(matches!(
        storage.check_password("alice", "nope-nope").await,
        Err(StoreError::InvalidCredentials)
    ));
    assert!(matches!(
        storage.check_password("ghost", "secret1").await,
        Err(StoreError::InvalidCredentials)
    ));
    Ok(())
}

#[tokio::test]
async fn user_creation_scenario() -> Result<()> {
    let storage = common::storage().await?;
    let mut request = bookstore::database::models::UserCreationRequest {
        username: "alice".into(),
        password: "secret1".into(),
        pseudonym: "Alice A".into(),
        is_admin: false,
    };
    validate_user_creation(&storage, &request).await?;
    storage.create_user(&request).await?;

    request.pseudonym = "Alice Again".into();
    match validate_user_creation(&storage, &request).await {
        Err(ValidatorError::Invalid(e)) => assert_eq!(e.code(), "user_already_exists"),
        other => panic!("unexpected {:?}", other),
    }

    request.username = "alice2".into();
    request.password = "abc".into();
    match validate_user_creation(&storage, &request).await {
        Err(ValidatorError::Invalid(e)) => assert_eq!(e.code(), "password_min_length"),
        other => panic!("unexpected {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn constraint_race_surfaces_as_duplicate() -> Result<()> {
    let storage = common::storage().await?;
    let alice = common::seed_user(&storage, "alice", "secret1", "Alice A", false).await?;

    // Skipping validation, as a concurrent writer would
    let err = common::seed_user(&storage, "ALICE", "secret1", "Other", false)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::Duplicate(_))
    ));

    storage.create_book(alice.id, &book("Foo", 100)).await?;
    let err = storage.create_book(alice.id, &book("Foo", 50)).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
    Ok(())
}

#[tokio::test]
async fn pseudonym_race_is_reported_as_pseudonym_conflict() -> Result<()> {
    let storage = common::storage().await?;
    common::seed_user(&storage, "alice", "secret1", "Same", false).await?;

    let err = common::seed_user(&storage, "bob", "secret1", "Same", false)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::DuplicatePseudonym)
    ));

    let carol = common::seed_user(&storage, "carol", "secret1", "Carol", false).await?;
    let patch = UserModificationRequest {
        pseudonym: Some("Same".into()),
        ..Default::default()
    };
    let err = storage.update_user(carol.id, &patch).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicatePseudonym));

    let api = bookstore::error::ApiError::from(err);
    assert_eq!(api.status_code(), axum::http::StatusCode::CONFLICT);
    assert_eq!(api.message(), "pseudonym_already_exists");
    Ok(())
}

#[tokio::test]
async fn book_creation_scenario() -> Result<()> {
    let storage = common::storage().await?;
    let alice = common::seed_user(&storage, "alice", "secret1", "Alice A", false).await?;

    validate_book_creation(&storage, alice.id, &book("Foo", 100)).await?;
    let foo = storage.create_book(alice.id, &book("Foo", 100)).await?;
    assert_eq!(foo.user, alice);

    match validate_book_creation(&storage, alice.id, &book("Foo", 50)).await {
        Err(ValidatorError::Invalid(e)) => assert_eq!(e.code(), "book_already_exists"),
        other => panic!("unexpected {:?}", other),
    }
    match validate_book_creation(&storage, alice.id, &book("Bar", -5)).await {
        Err(ValidatorError::Invalid(e)) => assert_eq!(e.code(), "invalid_book_fields:price"),
        other => panic!("unexpected {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn book_patch_and_owner_snapshot() -> Result<()> {
    let storage = common::storage().await?;
    let alice = common::seed_user(&storage, "alice", "secret1", "Alice A", false).await?;
    let created = storage.create_book(alice.id, &book("Foo", 100)).await?;

    let patch = BookModificationRequest {
        price: Some(250),
        ..Default::default()
    };
    let updated = storage.update_book(created.id, &patch).await?.expect("book exists");
    assert_eq!(updated.price, 250);
    assert_eq!(updated.title, created.title);
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.image_url, created.image_url);

    // The snapshot follows the owner
    storage
        .update_user(
            alice.id,
            &UserModificationRequest {
                pseudonym: Some("Alice Renamed".into()),
                ..Default::default()
            },
        )
        .await?;
    let reread = storage.book_by_id(created.id).await?.expect("book exists");
    assert_eq!(reread.user.pseudonym, "Alice Renamed");

    assert!(storage.update_book(9999, &patch).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn deleting_a_user_removes_their_books() -> Result<()> {
    let storage = common::storage().await?;
    let alice = common::seed_user(&storage, "alice", "secret1", "Alice A", false).await?;
    let bob = common::seed_user(&storage, "bob", "secret1", "Bob B", false).await?;
    let foo = storage.create_book(alice.id, &book("Foo", 100)).await?;
    storage.create_book(bob.id, &book("Bar", 100)).await?;

    assert!(storage.delete_user(alice.id).await?);
    assert!(storage.user_by_id(alice.id).await?.is_none());
    assert!(storage.book_by_id(foo.id).await?.is_none());
    assert!(storage.books_by_user(alice.id).await?.is_empty());

    let remaining = storage.books().await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].user_id, bob.id);

    assert!(!storage.delete_user(alice.id).await?);
    Ok(())
}

#[tokio::test]
async fn price_filters_are_inclusive_and_intersect() -> Result<()> {
    let storage = common::storage().await?;
    let alice = common::seed_user(&storage, "alice", "secret1", "Alice A", false).await?;
    for (title, price) in [("A", 50), ("B", 100), ("C", 150), ("D", 200)] {
        storage.create_book(alice.id, &book(title, price)).await?;
    }

    let prices = |books: Vec<bookstore::database::models::Book>| {
        let mut prices: Vec<i64> = books.into_iter().map(|b| b.price).collect();
        prices.sort();
        prices
    };

    assert_eq!(prices(storage.books().await?), vec![50, 100, 150, 200]);

    let min = BookListingRequest { min_price: Some(100), ..Default::default() };
    assert_eq!(prices(storage.search_books(&min).await?), vec![100, 150, 200]);

    let max = BookListingRequest { max_price: Some(150), ..Default::default() };
    assert_eq!(prices(storage.search_books(&max).await?), vec![50, 100, 150]);

    let both = BookListingRequest {
        min_price: Some(100),
        max_price: Some(150),
        ..Default::default()
    };
    assert_eq!(prices(storage.search_books(&both).await?), vec![100, 150]);
    Ok(())
}

#[tokio::test]
async fn default_order_is_title_descending() -> Result<()> {
    let storage = common::storage().await?;
    let brown = common::seed_user(&storage, "brown", "secret1", "Dan Brown", false).await?;
    storage.create_book(brown.id, &book("Da Vinci Code", 100)).await?;
    storage.create_book(brown.id, &book("Inferno", 100)).await?;

    let titles: Vec<String> = storage
        .books_by_user(brown.id)
        .await?
        .into_iter()
        .map(|b| b.title)
        .collect();
    assert_eq!(titles, vec!["Inferno", "Da Vinci Code"]);
    Ok(())
}

#[tokio::test]
async fn substring_search_treats_wildcards_literally() -> Result<()> {
    let storage = common::storage().await?;
    let alice = common::seed_user(&storage, "alice", "secret1", "Alice A", false).await?;
    storage.create_book(alice.id, &book("100% Rust", 100)).await?;
    storage.create_book(alice.id, &book("1000 Recipes", 100)).await?;

    let request = BookListingRequest { title: Some("100%".into()), ..Default::default() };
    let found = storage.search_books(&request).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "100% Rust");
    Ok(())
}

#[tokio::test]
async fn fetch_one_reports_ambiguity() -> Result<()> {
    let storage = common::storage().await?;
    let alice = common::seed_user(&storage, "alice", "secret1", "Alice A", false).await?;
    let bob = common::seed_user(&storage, "bob", "secret1", "Bob B", false).await?;
    let foo = storage.create_book(alice.id, &book("Foo", 100)).await?;
    storage.create_book(alice.id, &book("Bar", 100)).await?;

    assert!(BookQuery::new().owner(bob.id).fetch_one(storage.pool()).await?.is_none());
    assert_eq!(
        BookQuery::new().book(foo.id).fetch_one(storage.pool()).await?.map(|b| b.id),
        Some(foo.id)
    );
    assert!(matches!(
        BookQuery::new().owner(alice.id).fetch_one(storage.pool()).await,
        Err(StoreError::AmbiguousMatch(_))
    ));

    // The owner must match too
    assert!(storage.book_for_user(bob.id, foo.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn users_are_listed_by_username() -> Result<()> {
    let storage = common::storage().await?;
    common::seed_user(&storage, "carol", "secret1", "Carol", false).await?;
    common::seed_user(&storage, "alice", "secret1", "Alice", false).await?;
    common::seed_user(&storage, "bob", "secret1", "Bob", true).await?;

    let names: Vec<String> = storage.users().await?.into_iter().map(|u| u.username).collect();
    assert_eq!(names, vec!["alice", "bob", "carol"]);
    Ok(())
}
