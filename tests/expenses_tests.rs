mod common;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test, App};
    use receipt_api::api;
    use receipt_api::config::FallbackTarget;
    use receipt_api::error::ErrorEnvelope;
    use receipt_api::expenses::models::SubmitExpenseResponse;
    use receipt_api::settings::models::Settings;
    use receipt_api::settings::store::{InMemorySettingsStore, SettingsStore};
    use serde_json::{json, Value};
    use uuid::Uuid;

    use super::common::{self, FakeGoogle, GOOGLE_TOKEN};

    macro_rules! app_with {
        ($store:expr, $google:expr, $fallback:expr) => {
            test::init_service(
                App::new()
                    .app_data(common::state($store, $google, $fallback))
                    .app_data(common::verifier())
                    .configure(api::configure),
            )
            .await
        };
    }

    fn expense() -> Value {
        json!({
            "date": "2024-01-01",
            "commercant": "Acme",
            "montant_ttc": 12.5,
            "categorie": "Transport",
            "motif": "",
            "googleToken": GOOGLE_TOKEN
        })
    }

    #[actix_web::test]
    async fn test_submit_expense_appends_one_row() {
        let store = Arc::new(InMemorySettingsStore::new());
        let google = Arc::new(FakeGoogle::default());
        let user_id = Uuid::new_v4();
        store
            .upsert(user_id, &Settings::new("X", "Dépenses"))
            .await
            .unwrap();
        let app = app_with!(store, google.clone(), common::no_fallback());

        let req = test::TestRequest::post()
            .uri("/submit-expense")
            .insert_header(common::bearer(user_id))
            .set_json(expense())
            .to_request();

        let body: SubmitExpenseResponse = test::call_and_read_body_json(&app, req).await;
        assert!(body.success);
        assert_eq!(body.message, "Expense successfully added to Google Sheets");
        assert_eq!(body.details["updates"]["updatedRows"], 1);

        let calls = google.appended();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].spreadsheet_id, "X");
        assert_eq!(calls[0].range, "Dépenses!A:E");
        assert_eq!(calls[0].token, GOOGLE_TOKEN);
        assert_eq!(
            calls[0].row,
            vec!["2024-01-01", "Acme", "12.5", "Transport", ""]
        );
    }

    #[actix_web::test]
    async fn test_hebergement_keeps_its_accent() {
        let store = Arc::new(InMemorySettingsStore::new());
        let google = Arc::new(FakeGoogle::default());
        let user_id = Uuid::new_v4();
        store
            .upsert(user_id, &Settings::new("X", "Dépenses"))
            .await
            .unwrap();
        let app = app_with!(store, google.clone(), common::no_fallback());

        let mut payload = expense();
        payload["categorie"] = json!("Hébergement");
        payload["motif"] = Value::Null;

        let req = test::TestRequest::post()
            .uri("/submit-expense")
            .insert_header(common::bearer(user_id))
            .set_json(payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(google.appended()[0].row[3], "Hébergement");
        assert_eq!(google.appended()[0].row[4], "");
    }

    #[actix_web::test]
    async fn test_missing_fields_are_listed() {
        let google = Arc::new(FakeGoogle::default());
        let app = app_with!(
            Arc::new(InMemorySettingsStore::new()),
            google.clone(),
            common::no_fallback()
        );

        let req = test::TestRequest::post()
            .uri("/submit-expense")
            .insert_header(common::bearer(Uuid::new_v4()))
            .set_json(json!({
                "montant_ttc": 10.0,
                "categorie": "Transport",
                "googleToken": GOOGLE_TOKEN
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorEnvelope = test::read_body_json(resp).await;
        assert_eq!(body.code, "validation_error");
        assert_eq!(body.error, "Missing required fields: commercant, date");
        assert!(google.appended().is_empty());
    }

    #[actix_web::test]
    async fn test_non_positive_amount_is_rejected() {
        let google = Arc::new(FakeGoogle::default());
        let app = app_with!(
            Arc::new(InMemorySettingsStore::new()),
            google.clone(),
            common::no_fallback()
        );

        let mut payload = expense();
        payload["montant_ttc"] = json!(0);

        let req = test::TestRequest::post()
            .uri("/submit-expense")
            .insert_header(common::bearer(Uuid::new_v4()))
            .set_json(payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorEnvelope = test::read_body_json(resp).await;
        assert!(body.error.contains("montant_ttc"));
        assert!(google.appended().is_empty());
    }

    #[actix_web::test]
    async fn test_unconfigured_spreadsheet_never_calls_google() {
        let google = Arc::new(FakeGoogle::default());
        let app = app_with!(
            Arc::new(InMemorySettingsStore::new()),
            google.clone(),
            common::no_fallback()
        );

        let req = test::TestRequest::post()
            .uri("/submit-expense")
            .insert_header(common::bearer(Uuid::new_v4()))
            .set_json(expense())
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorEnvelope = test::read_body_json(resp).await;
        assert_eq!(body.code, "configuration_error");
        assert_eq!(body.error, "Google Spreadsheet ID is not configured");
        assert!(google.appended().is_empty());
    }

    #[actix_web::test]
    async fn test_configuration_is_checked_before_provider_token() {
        let google = Arc::new(FakeGoogle::default());
        let app = app_with!(
            Arc::new(InMemorySettingsStore::new()),
            google.clone(),
            common::no_fallback()
        );

        let mut payload = expense();
        payload.as_object_mut().unwrap().remove("googleToken");

        let req = test::TestRequest::post()
            .uri("/submit-expense")
            .insert_header(common::bearer(Uuid::new_v4()))
            .set_json(payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorEnvelope = test::read_body_json(resp).await;
        assert_eq!(body.code, "configuration_error");
        assert!(google.appended().is_empty());
    }

    #[actix_web::test]
    async fn test_fallback_target_applies_without_stored_settings() {
        let google = Arc::new(FakeGoogle::default());
        let fallback = FallbackTarget {
            spreadsheet_id: Some("env-sheet".to_string()),
            sheet_name: "Dépenses".to_string(),
        };
        let app = app_with!(Arc::new(InMemorySettingsStore::new()), google.clone(), fallback);

        let req = test::TestRequest::post()
            .uri("/submit-expense")
            .insert_header(common::bearer(Uuid::new_v4()))
            .set_json(expense())
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(google.appended()[0].spreadsheet_id, "env-sheet");
    }

    #[actix_web::test]
    async fn test_stored_settings_win_over_fallback() {
        let store = Arc::new(InMemorySettingsStore::new());
        let google = Arc::new(FakeGoogle::default());
        let user_id = Uuid::new_v4();
        store
            .upsert(user_id, &Settings::new("mine", "Notes"))
            .await
            .unwrap();
        let fallback = FallbackTarget {
            spreadsheet_id: Some("env-sheet".to_string()),
            sheet_name: "Dépenses".to_string(),
        };
        let app = app_with!(store, google.clone(), fallback);

        let req = test::TestRequest::post()
            .uri("/submit-expense")
            .insert_header(common::bearer(user_id))
            .set_json(expense())
            .to_request();

        test::call_service(&app, req).await;
        let calls = google.appended();
        assert_eq!(calls[0].spreadsheet_id, "mine");
        assert_eq!(calls[0].range, "Notes!A:E");
    }

    #[actix_web::test]
    async fn test_missing_provider_token_requires_reconnect() {
        let store = Arc::new(InMemorySettingsStore::new());
        let google = Arc::new(FakeGoogle::default());
        let user_id = Uuid::new_v4();
        store
            .upsert(user_id, &Settings::new("X", "Dépenses"))
            .await
            .unwrap();
        let app = app_with!(store, google.clone(), common::no_fallback());

        let mut payload = expense();
        payload.as_object_mut().unwrap().remove("googleToken");

        let req = test::TestRequest::post()
            .uri("/submit-expense")
            .insert_header(common::bearer(user_id))
            .set_json(payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorEnvelope = test::read_body_json(resp).await;
        assert_eq!(body.code, "reconnect_required");
        assert!(google.appended().is_empty());
    }

    #[actix_web::test]
    async fn test_sheets_failure_is_reported() {
        let store = Arc::new(InMemorySettingsStore::new());
        let google = Arc::new(FakeGoogle::default());
        google.fail_with(404, "Requested entity was not found.");
        let user_id = Uuid::new_v4();
        store
            .upsert(user_id, &Settings::new("gone", "Dépenses"))
            .await
            .unwrap();
        let app = app_with!(store, google, common::no_fallback());

        let req = test::TestRequest::post()
            .uri("/submit-expense")
            .insert_header(common::bearer(user_id))
            .set_json(expense())
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: ErrorEnvelope = test::read_body_json(resp).await;
        assert_eq!(body.code, "upstream_error");
        assert!(body.error.contains("Requested entity was not found."));
    }
}
