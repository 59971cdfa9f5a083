use sqlrepo::{
	blocks::{
		Pagination,
		SortOptions,
	},
	filter,
	Buildable,
	CursorRequest,
	QueryBuilder,
	Value,
};

use crate::helpers::{
	NormalizeString,
	User,
};

#[test]
fn cursor_wraps_the_base_query_in_numbered_rows() {
	let plan = QueryBuilder::<User>::read()
		.filter(&filter![("name", "like", "a%")])
		.unwrap()
		.order_by(SortOptions::desc("id"))
		.build();
	let cursor = plan.cursor(CursorRequest::new(20, 10).unwrap());

	assert_eq!(
		cursor.sql().normalize(),
		r#"SELECT * FROM (SELECT "t1".*, ROW_NUMBER() OVER () AS "row_num"
			FROM (SELECT "users".* FROM "users"
				WHERE ("name" LIKE $1) ORDER BY "id" DESC) AS "t1") AS "users"
			WHERE "row_num" > $2 ORDER BY "row_num" LIMIT $3"#
			.normalize()
	);
	assert_eq!(cursor.params(), vec![
		Value::from("a%"),
		Value::Int(20),
		Value::Int(10),
	]);
}

#[test]
fn cursor_ignores_offset_paging_of_the_base() {
	let plan = QueryBuilder::<User>::read()
		.paginate(Pagination {
			page:      3,
			page_size: 7,
		})
		.build();
	let cursor = plan.cursor(CursorRequest::start(5).unwrap());

	assert!(!cursor.sql().contains("OFFSET"));
	assert_eq!(cursor.params(), vec![Value::Int(0), Value::Int(5)]);
}

#[test]
fn cursor_keeps_joins_inside_the_numbered_set() {
	let plan = QueryBuilder::<User>::read()
		.join_relation("role")
		.unwrap()
		.filter(&filter![("roles.name", "admin")])
		.unwrap()
		.build();

	let sql = plan.cursor(CursorRequest::start(10).unwrap()).sql();

	assert!(sql.contains(
		r#"FROM (SELECT "users".* FROM "users" LEFT JOIN "roles" ON "users"."role_id" = "roles"."id" WHERE ("roles"."name" = $1) ORDER BY "users"."id" ASC) AS "t1""#
	));
}

#[test]
fn unsorted_cursor_numbers_rows_by_primary_key() {
	let plan = QueryBuilder::<User>::read().build();

	assert_eq!(
		plan.cursor(CursorRequest::start(3).unwrap()).sql().normalize(),
		r#"SELECT * FROM (SELECT "t1".*, ROW_NUMBER() OVER () AS "row_num"
			FROM (SELECT "users".* FROM "users" ORDER BY "users"."id" ASC) AS "t1")
			AS "users" WHERE "row_num" > $1 ORDER BY "row_num" LIMIT $2"#
			.normalize()
	);
}
