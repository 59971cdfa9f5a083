use claims::{
	assert_none,
	assert_ok,
	assert_some_eq,
};
use serde_json::json;
use sqlrepo::{
	blocks::{
		Pagination,
		SortOptions,
		SortOrder,
	},
	criteria::{
		FilterInput,
		RelationCriterion,
	},
	filter,
	CursorRequest,
	Repository,
	SqlRepository,
	Value,
};
use sqlx::{
	migrate,
	postgres::{
		PgConnectOptions,
		PgPoolOptions,
		PgSslMode,
	},
	PgPool,
};
use uuid::Uuid;

use crate::helpers::User;

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
	pub username:      String,
	pub password:      String,
	pub port:          u16,
	pub host:          String,
	pub database_name: String,
	pub require_ssl:   bool,
}

impl DatabaseSettings {
	pub fn with_db(&self) -> PgConnectOptions {
		self.without_db().database(&self.database_name)
	}

	pub fn without_db(&self) -> PgConnectOptions {
		let ssl_mode = if self.require_ssl {
			PgSslMode::Require
		} else {
			PgSslMode::Prefer
		};

		PgConnectOptions::new()
			.host(&self.host)
			.username(&self.username)
			.password(&self.password)
			.port(self.port)
			.ssl_mode(ssl_mode)
	}
}

/// Fresh, migrated database per test.
pub async fn get_connection_pool() -> PgPool {
	let mut cfg = DatabaseSettings {
		username:      "postgres".into(),
		password:      "password".into(),
		port:          2345,
		host:          "localhost".into(),
		database_name: "postgres".into(),
		require_ssl:   false,
	};

	let server_pool = PgPoolOptions::new()
		.max_connections(1)
		.connect_with(cfg.without_db())
		.await
		.expect("connect server");

	let db_name = Uuid::new_v4().to_string();

	sqlx::query(&format!(r#"CREATE DATABASE "{}""#, db_name))
		.execute(&server_pool)
		.await
		.expect("create db");

	cfg.database_name = db_name;
	let pool = PgPoolOptions::new()
		.max_connections(5)
		.connect_with(cfg.with_db())
		.await
		.expect("connect new db");

	migrate!("../migrations").run(&pool).await.unwrap();

	pool
}

async fn seed(pool: &PgPool) {
	sqlx::raw_sql(
		r#"
		INSERT INTO roles (id, name) VALUES (1, 'admin'), (2, 'staff');
		INSERT INTO users (id, name, email, role_id, supervisor_id) VALUES
			(1, 'Ada', 'ada@example.com', 1, NULL),
			(2, 'Ben', 'ben@example.com', 2, 1),
			(3, 'Cy', 'cy@example.com', 2, 2),
			(4, 'Di', 'di@example.com', NULL, 1);
		INSERT INTO cars (user_id, model) VALUES
			(2, 'Tesla'), (2, 'Fiat'), (3, 'Volvo');
		INSERT INTO profiles (id, user_id, bio) VALUES (1, 3, 'hi');
		INSERT INTO phones (profile_id, number) VALUES (1, '+4930123');
		INSERT INTO teams (id, name) VALUES (1, 'core');
		INSERT INTO team_user (team_id, user_id) VALUES (1, 4);
		INSERT INTO notes (notable_id, notable_type, body) VALUES
			(1, 'user', 'todo: review'), (1, 'car', 'todo: wash');
		SELECT setval('users_id_seq', 4);
		"#,
	)
	.execute(pool)
	.await
	.expect("seed");
}

fn names(users: &[User]) -> Vec<&str> {
	users.iter().map(|u| u.name.as_str()).collect()
}

#[tokio::test]
async fn crud_round_trip() {
	let pool = get_connection_pool().await;
	let users = SqlRepository::<User>::new(pool);

	let created = assert_ok!(users.create(&User::named("Eve")).await);
	let id = created.id.expect("generated key");

	let mut found = assert_ok!(users.find_or_fail(Value::Int(id)).await);
	assert_eq!(found, created);

	found.email = "eve@corp.io".into();
	let saved = assert_ok!(users.save(&found).await);
	assert_eq!(saved.email, "eve@corp.io");

	assert_ok!(users.delete(&saved).await);
	let err = users.find_or_fail(Value::Int(id)).await.unwrap_err();
	assert!(err.is_not_found());

	let err = users.delete(&saved).await.unwrap_err();
	assert_eq!(err.to_string(), "User: Cannot delete User record (delete)");
}

#[tokio::test]
async fn relation_criteria_filter_rows() {
	let pool = get_connection_pool().await;
	seed(&pool).await;
	let users = SqlRepository::<User>::new(pool);
	let by_id = SortOrder::from(SortOptions::asc("id"));

	let with_tesla = filter![RelationCriterion::new(
		"cars",
		filter![("model", "like", "Tes%")],
	)];
	let found = assert_ok!(users.get(Some(&with_tesla), Some(&by_id)).await);
	assert_eq!(names(&found), ["Ben"]);

	let supervised_by_ada = filter![RelationCriterion::new(
		"supervisor",
		filter![("name", "Ada")],
	)];
	let found =
		assert_ok!(users.get(Some(&supervised_by_ada), Some(&by_id)).await);
	assert_eq!(names(&found), ["Ben", "Di"]);

	let with_phone = filter![RelationCriterion::new(
		"profile",
		filter![RelationCriterion::new("phones", filter![])],
	)];
	let found = assert_ok!(users.get(Some(&with_phone), None).await);
	assert_eq!(names(&found), ["Cy"]);

	let in_core_or_noted = filter![
		RelationCriterion::new("teams", filter![("name", "core")]),
		RelationCriterion::new("notes", filter![("body", "like", "todo%")])
			.or(),
	];
	let found =
		assert_ok!(users.get(Some(&in_core_or_noted), Some(&by_id)).await);
	assert_eq!(names(&found), ["Ada", "Di"]);
}

#[tokio::test]
async fn find_where_and_count() {
	let pool = get_connection_pool().await;
	seed(&pool).await;
	let users = SqlRepository::<User>::new(pool);

	let staff = filter![("role_id", 2)];
	assert_eq!(assert_ok!(users.count(Some(&staff)).await), 2);
	assert_eq!(assert_ok!(users.count(None).await), 4);

	let last = assert_ok!(
		users
			.find_where(&staff, Some(&SortOrder::from(SortOptions::desc("id"))))
			.await
	);
	assert_some_eq!(last.map(|u| u.name), "Cy".to_owned());

	assert_none!(assert_ok!(users.find_where(&filter![("id", 99)], None).await));
}

#[tokio::test]
async fn uuid_and_timestamp_shaped_text_filters_text_columns() {
	let pool = get_connection_pool().await;
	let users = SqlRepository::<User>::new(pool);

	for name in [Uuid::new_v4().to_string(), "2024-01-02T03:04:05Z".into()] {
		let created = assert_ok!(users.create(&User::named(&name)).await);
		let input =
			assert_ok!(FilterInput::from_json("User", &json!({ "name": name })));

		let found = assert_ok!(users.get(Some(&input), None).await);
		assert_eq!(found, [created]);
	}
}

#[tokio::test]
async fn pages_report_totals() {
	let pool = get_connection_pool().await;
	seed(&pool).await;
	let users = SqlRepository::<User>::new(pool);
	let by_id = SortOrder::from(SortOptions::asc("id"));

	let page = assert_ok!(
		users
			.get_page(
				Pagination {
					page:      1,
					page_size: 3,
				},
				None,
				Some(&by_id),
			)
			.await
	);
	assert_eq!(names(&page.items), ["Di"]);
	assert_eq!(page.total, 4);
	assert_eq!(page.total_pages, 2);

	let past_the_end = assert_ok!(
		users
			.get_page(
				Pagination {
					page:      5,
					page_size: 3,
				},
				None,
				Some(&by_id),
			)
			.await
	);
	assert!(past_the_end.items.is_empty());
	assert_eq!(past_the_end.total, 4);
}

#[tokio::test]
async fn cursor_pages_walk_the_whole_set() {
	let pool = get_connection_pool().await;
	seed(&pool).await;
	let users = SqlRepository::<User>::new(pool);
	let by_name = SortOrder::from(SortOptions::desc("name"));

	let mut request = CursorRequest::start(3).unwrap();
	let mut seen = Vec::new();
	loop {
		let page = assert_ok!(
			users.get_cursor_page(request, None, Some(&by_name)).await
		);
		seen.extend(page.items.iter().map(|u| u.name.clone()));
		if !page.has_more {
			break;
		}
		request = page.next_request();
	}

	assert_eq!(seen, ["Di", "Cy", "Ben", "Ada"]);
}

#[tokio::test]
async fn eager_relations_and_counts() {
	let pool = get_connection_pool().await;
	seed(&pool).await;
	let users = SqlRepository::<User>::new(pool);

	let loaded = assert_ok!(
		users
			.get_with(
				&["role".to_owned()],
				&["cars".to_owned()],
				Some(&filter![("id", "in", vec![1, 2])]),
				Some(&SortOrder::from(SortOptions::asc("id"))),
			)
			.await
	);

	assert_eq!(loaded.len(), 2);
	assert_some_eq!(
		loaded[0].relation("role"),
		&json!({ "id": 1, "name": "admin" })
	);
	assert_some_eq!(loaded[0].count("cars"), 0);
	assert_some_eq!(loaded[1].count("cars"), 2);

	let cars = assert_ok!(
		users
			.get_with(&["cars".to_owned()], &[], Some(&filter![("id", 4)]), None)
			.await
	);
	assert_some_eq!(cars[0].relation("cars"), &json!([]));
}
