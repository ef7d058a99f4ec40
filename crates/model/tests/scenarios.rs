//! End-to-end behavior of models and collections.

use knockup_core::{object, Value};
use knockup_model::{Definition, ModelType, Query};
use std::cell::Cell;
use std::rc::Rc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_greeting_reader_exports() {
    init_tracing();
    let greeter = ModelType::new(
        Definition::new()
            .property("name", "")
            .function("readGreeting", |m, _| format!("Hi {}", m.get("name")).into()),
    );

    let ann = greeter.create(object! { "name" => "Ann" });

    assert_eq!(ann.export().get("greeting"), Some(&Value::from("Hi Ann")));
    assert_eq!(ann.get("name"), Value::from("Ann"));
}

#[test]
fn test_insert_insert_remove() {
    let animals = ModelType::new(Definition::new().property("name", "")).collection();
    let pets = animals.create(Value::Null);

    pets.insert(0, object! { "name" => "Cat" });
    pets.insert(1, object! { "name" => "Dog" });
    pets.remove(0);

    assert_eq!(pets.len(), 1);
    assert_eq!(pets.at(0).map(|m| m.get("name")), Some(Value::from("Dog")));
}

#[test]
fn test_relation_parent_set_at_construction() {
    let child = ModelType::new(Definition::new().property("x", 0));
    let parent_type = ModelType::new(Definition::new().relation("child", child));

    let parent = parent_type.create(Value::Null);

    let child = parent.child("child").unwrap();
    assert!(child.parent().unwrap().ptr_eq(&parent));
}

#[test]
fn test_find_open_tasks_paged() {
    let task = ModelType::new(Definition::new().property("status", "").property("id", 0));
    let tasks = task.collection().create(
        (0..5)
            .map(|id| {
                let status = if id % 2 == 0 { "open" } else { "closed" };
                Value::from(object! { "status" => status, "id" => id })
            })
            .collect::<Vec<_>>(),
    );
    let ids = |page: usize| {
        tasks
            .find(object! { "status" => "open" }, Some(2), Some(page))
            .items()
            .iter()
            .map(|m| m.get("id"))
            .collect::<Vec<_>>()
    };

    assert_eq!(ids(1), vec![Value::from(0), Value::from(2)]);
    assert_eq!(ids(2), vec![Value::from(4)]);
    assert!(ids(3).is_empty());
}

#[test]
fn test_late_insertions_take_collection_parent() {
    let member = ModelType::new(Definition::new().property("name", ""));
    let team_type = ModelType::new(Definition::new().relation("members", member.collection()));
    let team = team_type.create(object! { "members" => vec![object! { "name" => "a" }] });

    let members = team.children("members").unwrap();
    members.append(object! { "name" => "b" });
    members.prepend(member.create(object! { "name" => "c" }));
    members.replace(1, object! { "name" => "d" });

    assert_eq!(members.len(), 3);
    members.each(|_, m| {
        assert!(m.parent().unwrap().ptr_eq(&team));
        std::ops::ControlFlow::Continue(())
    });
    assert!(members.parent().unwrap().ptr_eq(&team));
}

#[test]
fn test_nested_round_trip() {
    let address = ModelType::new(Definition::new().property("city", "").property("zip", ""));
    let phone = ModelType::new(Definition::new().property("number", ""));
    let person = ModelType::new(
        Definition::new()
            .property("name", "")
            .property("tags", Vec::<Value>::new())
            .relation("address", address)
            .relation("phones", phone.collection()),
    );

    let data = object! {
        "name" => "Ann",
        "tags" => vec!["a", "b"],
        "address" => object! { "city" => "Oslo", "zip" => "0150" },
        "phones" => vec![object! { "number" => "1" }, object! { "number" => "2" }],
    };

    let ann = person.create(data.clone());
    assert_eq!(ann.export(), data);

    let copy = person.create(&ann);
    assert_eq!(copy.export(), data);

    // Re-importing the same collection data replaces rather than appends.
    ann.import(data.clone());
    assert_eq!(ann.children("phones").unwrap().len(), 2);
}

#[test]
fn test_reactive_export_tracks_field_changes() {
    let counter = ModelType::new(Definition::new().property("n", 0));
    let model = counter.create(Value::Null);
    let reader = model.clone();
    let exported = knockup_reactive::Computed::read_only(move || Value::from(&reader));

    let seen = Rc::new(Cell::new(0));
    let seen_clone = seen.clone();
    exported.subscribe(move |_| seen_clone.set(seen_clone.get() + 1));
    exported.get();

    model.set("n", 1);
    model.set("n", 2);

    assert_eq!(seen.get(), 2);
    assert_eq!(exported.get(), Value::from(object! { "n" => 2 }));
}

#[test]
fn test_find_with_model_query() {
    let task = ModelType::new(Definition::new().property("status", "").property("owner", ""));
    let tasks = task.collection().create(vec![
        object! { "status" => "open", "owner" => "ann" },
        object! { "status" => "open", "owner" => "bob" },
    ]);
    let probe = task.create(object! { "status" => "open", "owner" => "bob" });

    let found = tasks.find(&probe, None, None);
    assert_eq!(found.len(), 1);
    assert_eq!(found.first().unwrap().get("owner"), Value::from("bob"));

    let predicate = tasks.find(Query::predicate(|m, _| m.get("owner") == Value::from("ann")), None, None);
    assert_eq!(predicate.len(), 1);
}
