#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use tally::api::{create_router, AppState};
use tally::auth::{hash_password, Identity, TokenKeys};
use tally::db::Database;
use tally::models::{CreateUserInput, Role, User};
use tally::policy::ClosedStagePolicy;

pub const PASSWORD: &str = "correct horse battery";
pub const SECRET: &str = "test-secret";

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub admin: User,
    pub admin_token: String,
    pub member_token: String,
}

fn create_user(db: &Database, name: &str, email: &str, role: Role) -> User {
    db.create_user(CreateUserInput {
        name: name.to_string(),
        email: email.to_string(),
        password_hash: hash_password(PASSWORD, 4).unwrap(),
        role,
    })
    .unwrap()
}

pub fn spawn_app() -> TestApp {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    db.seed_default_stages().unwrap();

    let admin = create_user(&db, "Avery", "avery@example.com", Role::Admin);
    let member = create_user(&db, "Morgan", "morgan@example.com", Role::Member);

    let tokens = TokenKeys::new(SECRET, chrono::Duration::hours(1));
    let admin_token = tokens.issue(&Identity::from(&admin)).unwrap();
    let member_token = tokens.issue(&Identity::from(&member)).unwrap();

    let state = AppState::new(db, Arc::new(ClosedStagePolicy::default()), tokens);
    let server = TestServer::new(create_router(state.clone())).unwrap();

    TestApp {
        server,
        state,
        admin,
        admin_token,
        member_token,
    }
}
