use sqlrepo::{
	blocks::SelectType,
	eager,
	filter,
	Buildable,
	Error,
	QueryBuilder,
	Value,
};

use crate::helpers::{
	NormalizeString,
	User,
};

fn names(xs: &[&str]) -> Vec<String> {
	xs.iter().map(|&x| x.to_owned()).collect()
}

#[test]
fn relations_load_as_json_columns() {
	let columns =
		eager::columns::<User>(&names(&["role", "cars"]), &names(&["notes"]))
			.unwrap();
	let plan = columns
		.into_iter()
		.fold(QueryBuilder::<User>::read(), |q, c| q.select(c))
		.filter(&filter![("name", "x")])
		.unwrap()
		.build();

	assert_eq!(
		plan.sql(SelectType::Star).normalize(),
		r#"SELECT "users".*,
			(SELECT to_json("roles") FROM "roles"
				WHERE "users"."role_id" = "roles"."id" LIMIT 1) AS "role",
			(SELECT COALESCE(json_agg("cars"), '[]'::json) FROM "cars"
				WHERE "users"."id" = "cars"."user_id") AS "cars",
			(SELECT COUNT(*) FROM "notes"
				WHERE "users"."id" = "notes"."notable_id"
				AND "notes"."notable_type" = $1) AS "notes_count"
			FROM "users" WHERE ("name" = $2)"#
			.normalize()
	);
	assert_eq!(plan.params(SelectType::Star), vec![
		Value::from("user"),
		Value::from("x"),
	]);
}

#[test]
fn self_relations_load_through_an_alias() {
	let columns = eager::columns::<User>(&names(&["supervisor"]), &[]).unwrap();

	assert_eq!(
		columns[0].sql(),
		r#"(SELECT to_json("users_exists_1") FROM "users" AS "users_exists_1" WHERE "users"."supervisor_id" = "users_exists_1"."id" LIMIT 1) AS "supervisor""#
	);
}

#[test]
fn counts_use_a_suffixed_column() {
	assert_eq!(eager::count_column("cars"), "cars_count");
}

#[test]
fn nested_paths_are_not_implemented() {
	let err = eager::columns::<User>(&names(&["profile.phones"]), &[])
		.unwrap_err();

	assert!(matches!(err, Error::NotImplemented { .. }), "{err}");
}

#[test]
fn unknown_relations_are_bad_criteria() {
	let err = eager::columns::<User>(&[], &names(&["pets"])).unwrap_err();

	assert!(err.is_bad_criteria());
}
