use askama::Template;

use crate::{
    flash::Flash,
    forms::RegisterForm,
    models::{Employee, SessionData},
};

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub flashes: Vec<Flash>,
    pub current_user: Option<SessionData>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub flashes: Vec<Flash>,
    pub current_user: Option<SessionData>,
    pub form: RegisterForm,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub flashes: Vec<Flash>,
    pub current_user: Option<SessionData>,
    pub email: String,
    pub next: Option<String>,
    pub csrf_token: String,
}

impl LoginTemplate {
    /// Form action, keeping `next` so the redirect survives a failed attempt.
    pub fn action(&self) -> String {
        match &self.next {
            Some(next) => format!("/login?next={}", urlencoding::encode(next)),
            None => "/login".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub flashes: Vec<Flash>,
    pub current_user: Option<SessionData>,
    pub employee: Employee,
}
