//! `#[derive(Model)]` output as seen through reflection and coercion.

#![cfg(feature = "derive")]

use fluentdb::{
    Entity, FieldType, Kind, MetaData, Model, OrmError, Value, reflect, reflect_type, set_value,
};
use proptest::prelude::*;

#[derive(Debug, Default, Model)]
struct Post {
    #[orm(model = "type:serial,primary")]
    id: i32,
    #[orm(model = "ref:authors;cascade:delete")]
    author_id: i64,
    title: String,
}

#[derive(Debug, Default, Model)]
struct AuthorProfile {
    #[orm(model = "type:serial,primary")]
    id: i64,
    bio: Option<String>,
}

#[derive(Debug, Default, Model)]
struct Author {
    #[orm(model = "table:authors")]
    meta: MetaData,
    #[orm(model = "type:serial,primary")]
    id: i64,
    #[orm(model = "name:full_name")]
    name: String,
    #[orm(column = "mail")]
    email: Option<String>,
    active: bool,
    #[orm(model = "rel:Post")]
    posts: Vec<Post>,
    #[orm(model = "rel:AuthorProfile")]
    profile: Option<AuthorProfile>,
}

#[test]
fn descriptor_lists_every_field() {
    let schema = Author::descriptor();
    assert_eq!(schema.name, "Author");

    let keys: Vec<_> = schema.fields.iter().map(|f| f.key).collect();
    assert_eq!(
        keys,
        ["meta", "id", "name", "email", "active", "posts", "profile"]
    );
    assert_eq!(schema.fields[0].kind, Kind::Metadata);
    assert_eq!(schema.fields[3].kind, <Option<String> as FieldType>::KIND);
    assert_eq!(schema.fields[3].column, Some("mail"));
    assert_eq!(schema.fields[5].kind, Kind::Relation);
}

#[test]
fn reflects_names_keys_and_relations() {
    let author = Author {
        id: 1,
        name: "Ann".into(),
        posts: vec![
            Post {
                id: 10,
                author_id: 1,
                title: "first".into(),
            },
            Post::default(),
        ],
        profile: Some(AuthorProfile::default()),
        ..Author::default()
    };

    let table = reflect(&author).unwrap();
    assert_eq!(table.name, "authors");

    let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        ["id", "full_name", "mail", "active", "posts", "profile"]
    );
    assert_eq!(table.columns[4].relation, "post");
    assert_eq!(table.primaries.len(), 1);
    assert_eq!(table.columns[0].types, "SERIAL PRIMARY KEY ");
    assert_eq!(table.value("full_name"), &Value::String("Ann".into()));
    assert_eq!(table.value("mail"), &Value::Null);
    assert!(table.has_data);

    // One nested table per related instance.
    assert_eq!(table.relation.len(), 3);
    assert_eq!(table.relation[0].name, "post");
    assert_eq!(table.relation[2].name, "author_profile");
}

#[test]
fn reference_columns_are_not_data() {
    let post = Post {
        id: 0,
        author_id: 3,
        title: "hello".into(),
    };
    let table = reflect(&post).unwrap();
    let author_id = table.column("author_id").unwrap();

    assert_eq!(
        author_id.reference,
        "REFERENCES authors (id) ON DELETE CASCADE "
    );
    assert!(author_id.is_not_data());
    // A zero serial key has no usable value.
    assert!(table.column("id").unwrap().is_not_data());
    assert!(table.present_primaries().next().is_none());
}

#[test]
fn type_reflection_has_no_values() {
    let table = reflect_type::<Author>().unwrap();
    assert!(!table.has_data);
    assert!(table.columns.iter().all(|c| !c.has_value));
    assert!(table.values.values().all(Value::is_null));
}

#[test]
fn assign_converts_and_names_the_field() {
    let mut author = Author::default();
    author.assign("id", Value::I64(5)).unwrap();
    author.assign("email", Value::from("a@b.c")).unwrap();
    author.assign("email", Value::Null).unwrap();
    assert_eq!(author.id, 5);
    assert_eq!(author.email, None);

    let err = author.assign("name", Value::Null).unwrap_err();
    assert!(matches!(err, OrmError::Conversion { ref field, .. } if field == "name"));

    let err = author.assign("nope", Value::I32(1)).unwrap_err();
    assert!(matches!(err, OrmError::Conversion { ref field, .. } if field == "nope"));

    assert!(author.assign("posts", Value::Null).is_err());
}

#[test]
fn set_value_coerces_across_kinds() {
    let mut post = Post::default();
    set_value(&mut post, "id", Value::U64(12)).unwrap();
    set_value(&mut post, "author_id", Value::from("42")).unwrap();
    set_value(&mut post, "title", Value::Null).unwrap();
    assert_eq!(post.id, 12);
    assert_eq!(post.author_id, 42);
    assert_eq!(post.title, "");

    let err = set_value(&mut post, "id", Value::from("twelve")).unwrap_err();
    assert!(matches!(err, OrmError::Conversion { .. }));
    assert_eq!(post.id, 12);
}

#[test]
fn relations_expose_nested_models() {
    let author = Author {
        posts: Vec::new(),
        profile: None,
        ..Author::default()
    };
    assert!(author.relations("posts").is_empty());
    assert!(author.relations("profile").is_empty());
    assert!(author.relations("name").is_empty());
    assert_eq!(author.values().len(), Author::descriptor().fields.len());
}

#[derive(Debug, Default, Clone, PartialEq, Model)]
struct Account {
    #[orm(model = "table:accounts")]
    meta: MetaData,
    #[orm(model = "type:serial,primary")]
    id: i64,
    #[orm(model = "name:display_name")]
    name: String,
    #[orm(column = "mail")]
    email: Option<String>,
    active: bool,
    score: f64,
}

/// Rebuild a default `M` from the values `reflect` produced for `source`.
fn rebuild<M: Model + Default>(source: &M) -> M {
    let table = reflect(source).unwrap();
    let mut rebuilt = M::default();
    for column in table.data_columns() {
        rebuilt
            .assign(&column.key, table.value(&column.name).clone())
            .unwrap();
    }
    rebuilt
}

#[test]
fn reflected_values_rebuild_the_model() {
    let account = Account {
        id: 9,
        name: "Ann".into(),
        email: Some("ann@example.com".into()),
        active: true,
        score: 1.5,
        ..Default::default()
    };
    assert_eq!(rebuild(&account), account);
}

proptest! {
    #[test]
    fn reflection_round_trips_plain_fields(
        id in 1i64..i64::MAX,
        name in ".{0,16}",
        email in proptest::option::of("[a-z]{1,8}@[a-z]{1,8}\\.com"),
        active in any::<bool>(),
        score in -1.0e9f64..1.0e9,
    ) {
        let account = Account { id, name, email, active, score, ..Default::default() };
        prop_assert_eq!(rebuild(&account), account);
    }
}
