use sqlrepo::{
	blocks::SelectType,
	filter,
	Buildable,
	Error,
	QueryBuilder,
};

use crate::helpers::{
	NormalizeString,
	User,
};

#[test]
fn belongs_to_joins_on_the_foreign_key() {
	let plan = QueryBuilder::<User>::read()
		.join_relation("role")
		.unwrap()
		.build();

	assert_eq!(
		plan.sql(SelectType::Star),
		r#"SELECT "users".* FROM "users" LEFT JOIN "roles" ON "users"."role_id" = "roles"."id""#
	);
}

#[test]
fn dotted_paths_join_each_hop_once() {
	let plan = QueryBuilder::<User>::read()
		.join_relation("profile")
		.unwrap()
		.join_relation("profile.phones")
		.unwrap()
		.filter(&filter![("phones.number", "like", "+49%")])
		.unwrap()
		.build();

	assert_eq!(
		plan.sql(SelectType::Star).normalize(),
		r#"SELECT "users".* FROM "users"
			LEFT JOIN "profiles" ON "profiles"."user_id" = "users"."id"
			LEFT JOIN "phones" ON "phones"."profile_id" = "profiles"."id"
			WHERE ("phones"."number" LIKE $1)"#
			.normalize()
	);
}

#[test]
fn belongs_to_many_joins_through_the_pivot() {
	let plan = QueryBuilder::<User>::read()
		.join_relation("teams")
		.unwrap()
		.build();

	assert_eq!(
		plan.sql(SelectType::Star).normalize(),
		r#"SELECT "users".* FROM "users"
			LEFT JOIN "team_user" ON "team_user"."user_id" = "users"."id"
			LEFT JOIN "teams" ON "team_user"."team_id" = "teams"."id""#
			.normalize()
	);
}

#[test]
fn unknown_segments_are_bad_criteria() {
	let err = QueryBuilder::<User>::read()
		.join_relation("profile.pets")
		.err()
		.expect("should be rejected");

	assert!(err.is_bad_criteria());
	assert!(err.to_string().starts_with("Profile:"), "{err}");
}

#[test]
fn polymorphic_joins_are_not_implemented() {
	let err = QueryBuilder::<User>::read()
		.join_relation("notes")
		.err()
		.expect("should be rejected");

	assert!(matches!(err, Error::NotImplemented { .. }), "{err}");
}
