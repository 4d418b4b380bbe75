use crate::cron::Context;
use axum::{http::Uri, Json, Router};
use chrono::{DateTime, TimeZone, Utc};
use db::{
    application::Application,
    facility::Facility,
    provider::Provider,
    shift::{Shift, Status},
    user::User,
    MemoryStore,
};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const FACILITY_ID: &str = "f1";
pub const FACILITY_NAME: &str = "Sunrise Care";
pub const FACILITY_EMAIL: &str = "desk@sunrise.example.com";
pub const SHIFT_TIME: &str = "08:00 - 16:00";
pub const FRONTEND_URL: &str = "https://app.example.com";
/// Nothing listens on the discard port.
pub const UNREACHABLE: &str = "http://127.0.0.1:9";

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn applicant_name(application_id: &str) -> String {
    format!("Applicant {application_id}")
}

/// A store holding one facility, plus helpers to add shifts, providers and
/// applications around it.
pub struct Fixture {
    pub store: MemoryStore,
}

impl Fixture {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        store
            .insert_user(User {
                id: "u-f1".to_string(),
                email: FACILITY_EMAIL.to_string(),
            })
            .unwrap();
        store
            .insert_facility(Facility {
                id: FACILITY_ID.to_string(),
                name: FACILITY_NAME.to_string(),
                user_id: "u-f1".to_string(),
            })
            .unwrap();
        Self { store }
    }

    pub fn provider(&self, id: &str, email: &str) {
        let user_id = format!("u-{id}");
        self.store
            .insert_user(User {
                id: user_id.clone(),
                email: email.to_string(),
            })
            .unwrap();
        self.store
            .insert_provider(Provider {
                id: id.to_string(),
                user_id,
            })
            .unwrap();
    }

    pub fn shift(&self, id: &str, shift_date: DateTime<Utc>) {
        self.shift_with(id, shift_date, |_| {});
    }

    pub fn shift_with<F>(&self, id: &str, shift_date: DateTime<Utc>, update: F)
    where
        F: FnOnce(&mut Shift),
    {
        let mut shift = Shift {
            id: id.to_string(),
            shift_date,
            shift_time: SHIFT_TIME.to_string(),
            status: Status::Pending,
            hired_provider_id: None,
            archived: false,
            facility_id: FACILITY_ID.to_string(),
        };
        update(&mut shift);
        self.store.insert_shift(shift).unwrap();
    }

    pub fn application(
        &self,
        id: &str,
        shift_id: &str,
        provider_id: &str,
        created_at: DateTime<Utc>,
    ) {
        self.store
            .insert_application(Application {
                id: id.to_string(),
                created_at,
                applicant_name: applicant_name(id),
                shift_id: shift_id.to_string(),
                applicant_id: provider_id.to_string(),
            })
            .unwrap();
    }

    pub fn context(&self, mailer_url: &str) -> Context {
        Context::new(
            Arc::new(self.store.clone()),
            mailer::Client::new(mailer_url).unwrap(),
            FRONTEND_URL,
        )
    }
}

/// Starts a local email service that forwards every request path and JSON
/// body it receives.
pub async fn capture() -> (String, mpsc::UnboundedReceiver<(String, serde_json::Value)>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().fallback(move |uri: Uri, Json(body): Json<serde_json::Value>| {
        let tx = tx.clone();
        async move {
            let _ = tx.send((uri.path().to_string(), body));
            "ok"
        }
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (format!("http://{addr}"), rx)
}
