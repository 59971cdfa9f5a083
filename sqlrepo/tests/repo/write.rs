use sqlrepo::{
	blocks::{
		Predicate,
		WhereGroup,
	},
	Buildable,
	QueryBuilder,
	Value,
};

use crate::helpers::User;

fn alice() -> User {
	User {
		id:            Some(7),
		name:          "Alice".into(),
		email:         "alice@example.com".into(),
		role_id:       Some(2),
		supervisor_id: None,
	}
}

#[test]
fn insert_skips_a_missing_key() {
	let plan = QueryBuilder::<User>::insert()
		.model(&User {
			id: None,
			..alice()
		})
		.build();

	assert_eq!(
		plan.sql(),
		r#"INSERT INTO "users" ("name", "email", "role_id", "supervisor_id") VALUES ($1, $2, $3, NULL) RETURNING *"#
	);
	assert_eq!(plan.params(), vec![
		Value::from("Alice"),
		Value::from("alice@example.com"),
		Value::Int(2),
	]);
}

#[test]
fn insert_keeps_a_given_key() {
	let plan = QueryBuilder::<User>::insert().model(&alice()).build();

	assert!(plan
		.sql()
		.starts_with(r#"INSERT INTO "users" ("id", "name", "email""#));
	assert_eq!(plan.params()[0], Value::Int(7));
}

#[test]
fn insert_without_values_uses_defaults() {
	let plan = QueryBuilder::<User>::insert().build();

	assert_eq!(
		plan.sql(),
		r#"INSERT INTO "users" DEFAULT VALUES RETURNING *"#
	);
}

#[test]
fn update_sets_columns_and_targets_the_key() {
	let plan = QueryBuilder::<User>::update().model(&alice()).build();

	assert_eq!(
		plan.sql(),
		r#"UPDATE "users" SET "name" = $1, "email" = $2, "role_id" = $3, "supervisor_id" = NULL WHERE ("id" = $4) RETURNING *"#
	);
	assert_eq!(plan.params().last(), Some(&Value::Int(7)));
}

#[test]
fn update_with_extra_condition() {
	let plan = QueryBuilder::<User>::update()
		.set("name", "Bob")
		.r#where(WhereGroup::new().and(Predicate::compare("role_id", ">", 3)))
		.r#where(WhereGroup::new().and(Predicate::compare("id", "<", 100)))
		.build();

	assert_eq!(
		plan.sql(),
		r#"UPDATE "users" SET "name" = $1 WHERE (("role_id" > $2) AND ("id" < $3)) RETURNING *"#
	);
}

#[test]
fn delete_targets_the_key() {
	let plan = QueryBuilder::<User>::delete().model(&alice()).build();

	assert_eq!(plan.sql(), r#"DELETE FROM "users" WHERE ("id" = $1)"#);
	assert_eq!(plan.params(), vec![Value::Int(7)]);
}
