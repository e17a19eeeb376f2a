use std::sync::Mutex;

use async_trait::async_trait;
use elif_factory::{
    attributes, FactoryError, FactoryResult, Factoryable, MemoryStore, ModelFactory, ModelRow,
    ModelSchema, PivotConfig, RowPersister,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Serialize, Deserialize)]
struct User {
    id: i64,
    email: String,
    role: String,
}

impl Factoryable for User {
    fn schema() -> ModelSchema {
        ModelSchema::new("User", "users")
            .has_one("profile", "Profile", "profiles", "user_id")
            .has_many("posts", "Post", "posts", "user_id")
            .belongs_to("team", "Team", "teams", "team_id")
            .many_to_many(
                "skills",
                "Skill",
                "skills",
                PivotConfig::new("skill_user", "user_id", "skill_id")
                    .with_additional_columns(vec!["proficiency".to_string()])
                    .with_timestamps(),
            )
    }
}

fn post_factory() -> ModelFactory {
    ModelFactory::define(ModelSchema::new("Post", "posts"), |ctx| {
        Ok(attributes! { "title" => ctx.faker.sentence(), "status" => "published" })
    })
    .state("draft", |row, _| {
        row.set("status", "draft");
        Ok(())
    })
}

fn profile_factory() -> ModelFactory {
    ModelFactory::define(ModelSchema::new("Profile", "profiles"), |ctx| {
        Ok(attributes! { "bio" => ctx.faker.paragraph() })
    })
}

fn team_factory() -> ModelFactory {
    ModelFactory::define(ModelSchema::new("Team", "teams"), |ctx| {
        Ok(attributes! { "name" => ctx.faker.word() })
    })
}

fn skill_factory() -> ModelFactory {
    ModelFactory::define(ModelSchema::new("Skill", "skills"), |ctx| {
        Ok(attributes! { "name" => ctx.faker.word() })
    })
}

fn user_factory() -> ModelFactory {
    let posts = post_factory();
    let profiles = profile_factory();
    let teams = team_factory();
    let skills = skill_factory();

    ModelFactory::for_model::<User, _>(|ctx| {
        Ok(attributes! { "email" => ctx.faker.email(), "role" => "member" })
    })
    .state("admin", |row, _| {
        row.set("role", "admin");
        Ok(())
    })
    .related("posts", move || posts.build())
    .unwrap()
    .related("profile", move || profiles.build())
    .unwrap()
    .related("team", move || teams.build())
    .unwrap()
    .related("skills", move || skills.build())
    .unwrap()
}

#[tokio::test]
async fn test_create_persists_row() {
    let store = MemoryStore::new();

    let user = user_factory().build().apply("admin").create(&store).await.unwrap();

    assert!(user.is_persisted());
    assert_eq!(user.key(), Some(&json!(1)));
    assert_eq!(user.get("role"), Some(&json!("admin")));
    assert_eq!(store.count("users"), 1);
}

#[tokio::test]
async fn test_has_many_children_carry_parent_key() {
    let store = MemoryStore::new();

    let user = user_factory()
        .build()
        .with_related("posts", 3, |posts| posts.apply("draft"))
        .create(&store)
        .await
        .unwrap();

    let posts = user.related("posts");
    assert_eq!(posts.len(), 3);
    for post in posts {
        assert_eq!(post.get("user_id"), user.key());
        assert_eq!(post.get("status"), Some(&json!("draft")));
        assert!(post.is_persisted());
    }
    assert_eq!(store.count("posts"), 3);
}

#[tokio::test]
async fn test_has_one_creates_single_row() {
    let store = MemoryStore::new();

    let user = user_factory()
        .build()
        .with("profile", 5)
        .create(&store)
        .await
        .unwrap();

    assert_eq!(user.related("profile").len(), 1);
    assert_eq!(store.count("profiles"), 1);
    assert_eq!(store.rows("profiles")[0].get("user_id"), Some(&json!(1)));
}

#[tokio::test]
async fn test_belongs_to_owner_created_first() {
    let store = MemoryStore::new();

    let user = user_factory()
        .build()
        .with_related("team", 1, |team| team.merge_attribute("name", "core"))
        .create(&store)
        .await
        .unwrap();

    let team = &user.related("team")[0];
    assert_eq!(team.get("name"), Some(&json!("core")));
    assert_eq!(user.get("team_id"), team.key());

    // The stored user row already carries the foreign key
    let stored = &store.rows("users")[0];
    assert_eq!(stored.get("team_id"), Some(&json!(1)));
}

#[tokio::test]
async fn test_many_to_many_inserts_pivot_rows() {
    let store = MemoryStore::new();

    let user = user_factory()
        .build()
        .with_related("skills", 2, |skills| {
            skills.pivot_attributes(attributes! { "proficiency" => "expert" })
        })
        .create(&store)
        .await
        .unwrap();

    assert_eq!(user.related("skills").len(), 2);
    assert_eq!(store.count("skills"), 2);

    let pivots = store.pivots("skill_user");
    assert_eq!(pivots.len(), 2);
    let skill_ids: Vec<Value> = pivots.iter().map(|p| p["skill_id"].clone()).collect();
    assert_eq!(skill_ids, vec![json!(1), json!(2)]);
    for pivot in &pivots {
        assert_eq!(pivot["user_id"], json!(1));
        assert_eq!(pivot["proficiency"], json!("expert"));
        assert!(pivot["created_at"].is_string());
    }
}

#[tokio::test]
async fn test_undeclared_pivot_attribute_is_rejected() {
    let store = MemoryStore::new();

    let err = user_factory()
        .build()
        .with_related("skills", 1, |skills| {
            skills.pivot_attributes(attributes! { "notes" => "n/a" })
        })
        .create(&store)
        .await
        .unwrap_err();

    assert!(matches!(err, FactoryError::Configuration { .. }));
    assert!(err.to_string().contains("notes"));
    assert_eq!(store.count("skills"), 0);
    assert!(store.pivots("skill_user").is_empty());
}

#[tokio::test]
async fn test_belongs_to_uses_owner_primary_key() {
    let store = MemoryStore::new();
    let orgs = ModelFactory::define(
        ModelSchema::new("Org", "orgs").with_primary_key("uuid"),
        |ctx| Ok(attributes! { "uuid" => ctx.faker.uuid(), "name" => ctx.faker.word() }),
    );
    let members = ModelFactory::define(
        ModelSchema::new("Member", "members").belongs_to("org", "Org", "orgs", "org_uuid"),
        |ctx| Ok(attributes! { "email" => ctx.faker.email() }),
    )
    .related("org", move || orgs.build())
    .unwrap();

    let member = members.build().with("org", 1).create(&store).await.unwrap();
    let org = &member.related("org")[0];
    assert!(org.get("uuid").unwrap().is_string());
    assert_eq!(member.get("org_uuid"), org.get("uuid"));
    assert_eq!(store.rows("members")[0].get("org_uuid"), org.get("uuid"));

    let made = members.build().with("org", 1).make().unwrap();
    assert!(!made.get("org_uuid").unwrap().is_null());
    assert_eq!(made.get("org_uuid"), made.related("org")[0].get("uuid"));
}

#[tokio::test]
async fn test_has_many_uses_primary_key_declared_later() {
    let store = MemoryStore::new();
    let accounts = ModelFactory::define(
        ModelSchema::new("Account", "accounts")
            .has_many("posts", "Post", "posts", "account_uuid")
            .with_primary_key("uuid"),
        |ctx| Ok(attributes! { "uuid" => ctx.faker.uuid() }),
    )
    .related("posts", || post_factory().build())
    .unwrap();

    let account = accounts.build().with("posts", 2).create(&store).await.unwrap();

    let key = account.get("uuid").cloned().unwrap();
    assert!(key.is_string());
    for post in account.related("posts") {
        assert_eq!(post.get("account_uuid"), Some(&key));
    }
    assert_eq!(store.count("posts"), 2);
}

/// Persister that records inserts but never assigns keys
#[derive(Default)]
struct KeylessStore {
    tables: Mutex<Vec<String>>,
}

#[async_trait]
impl RowPersister for KeylessStore {
    async fn insert(&self, row: &mut ModelRow) -> FactoryResult<()> {
        row.mark_persisted();
        self.tables.lock().unwrap().push(row.table().to_string());
        Ok(())
    }

    async fn insert_pivot(
        &self,
        table: &str,
        _attributes: Map<String, Value>,
    ) -> FactoryResult<()> {
        self.tables.lock().unwrap().push(table.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_missing_parent_key_after_insert_fails() {
    let store = KeylessStore::default();

    let err = user_factory()
        .build()
        .with("posts", 1)
        .create(&store)
        .await
        .unwrap_err();

    match err {
        FactoryError::MissingKey { model, column } => {
            assert_eq!(model, "User");
            assert_eq!(column, "id");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(*store.tables.lock().unwrap(), vec!["users".to_string()]);
}

#[tokio::test]
async fn test_create_many_wires_each_parent() {
    let store = MemoryStore::new();

    let users = user_factory()
        .build()
        .with("posts", 2)
        .create_many(3, &store)
        .await
        .unwrap();

    assert_eq!(users.len(), 3);
    assert_eq!(store.count("posts"), 6);
    for user in &users {
        for post in user.related("posts") {
            assert_eq!(post.get("user_id"), user.key());
        }
    }
}

#[tokio::test]
async fn test_create_as_typed_model() {
    let store = MemoryStore::new();

    let user: User = user_factory().build().create_as(&store).await.unwrap();

    assert_eq!(user.id, 1);
    assert_eq!(user.role, "member");
    assert!(user.email.contains('@'));
}

#[tokio::test]
async fn test_unknown_relation_persists_nothing() {
    let store = MemoryStore::new();

    let err = user_factory()
        .build()
        .with("followers", 2)
        .create(&store)
        .await
        .unwrap_err();

    assert!(matches!(err, FactoryError::UndefinedRelation { .. }));
    assert_eq!(store.count("users"), 0);
}

#[test]
fn test_make_wires_relations_without_keys() {
    let user = user_factory().build().with("posts", 2).make().unwrap();

    assert!(user.key().is_none());
    let posts = user.related("posts");
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].get("user_id"), Some(&Value::Null));
    assert!(!posts[0].is_persisted());
}

#[test]
fn test_make_stubbed_wires_stub_keys() {
    let user = user_factory()
        .build()
        .with("posts", 2)
        .with("team", 1)
        .make_stubbed()
        .unwrap();

    let user_key = user.key().cloned().unwrap();
    for post in user.related("posts") {
        assert_eq!(post.get("user_id"), Some(&user_key));
        assert!(post.key().is_some());
    }

    let team = &user.related("team")[0];
    assert!(team.key().is_some());
    assert_eq!(user.get("team_id"), team.key());
}

#[test]
fn test_make_many_as_typed_models_requires_keys() {
    // Made rows have no id, which the typed model requires
    let err = user_factory().build().make_many_as::<User>(2).unwrap_err();
    assert!(matches!(err, FactoryError::Serialization(_)));

    let users: Vec<User> = user_factory()
        .build()
        .merge_attribute("id", 10)
        .make_many_as(2)
        .unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|user| user.id == 10));
}
