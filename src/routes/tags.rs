use actix_web::{web, HttpResponse};

use crate::error::AppResult;
use crate::models::tag::{TagCreateForm, TagNameQuery, TagUpdateForm};
use crate::services::tag::TagService;
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/create").route(web::post().to(create_tag)))
        .service(web::resource("/update").route(web::post().to(update_tag)))
        .service(web::resource("/delete/{id}").route(web::delete().to(delete_tag_by_id)))
        .service(web::resource("/query/{id}").route(web::get().to(get_tag_by_id)))
        .service(web::resource("/list").route(web::get().to(get_tags)))
        .service(web::resource("/queryByName").route(web::get().to(get_tag_by_name)));
}

async fn create_tag(
    state: web::Data<AppState>,
    payload: web::Json<TagCreateForm>,
) -> AppResult<HttpResponse> {
    let tag_service = TagService::new(&state.db);
    let tag = tag_service.create_tag(&payload).await?;

    Ok(HttpResponse::Ok().json(tag))
}

async fn update_tag(
    state: web::Data<AppState>,
    payload: web::Json<TagUpdateForm>,
) -> AppResult<HttpResponse> {
    let tag_service = TagService::new(&state.db);
    let tag = tag_service.update_tag(&payload).await?;

    Ok(HttpResponse::Ok().json(tag))
}

async fn delete_tag_by_id(
    state: web::Data<AppState>,
    id: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let tag_service = TagService::new(&state.db);
    tag_service.delete_tag_by_id(*id).await?;

    Ok(HttpResponse::Ok().json(true))
}

async fn get_tag_by_id(
    state: web::Data<AppState>,
    id: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let tag_service = TagService::new(&state.db);
    let tag = tag_service.get_tag_by_id(*id).await?;

    Ok(HttpResponse::Ok().json(tag))
}

async fn get_tags(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let tag_service = TagService::new(&state.db);
    let tags = tag_service.get_active_tags().await?;

    Ok(HttpResponse::Ok().json(tags))
}

async fn get_tag_by_name(
    state: web::Data<AppState>,
    query: web::Query<TagNameQuery>,
) -> AppResult<HttpResponse> {
    let tag_service = TagService::new(&state.db);
    let tag = tag_service.get_active_tag_by_name(&query.tag_name).await?;

    Ok(HttpResponse::Ok().json(tag))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::db::Database;
    use crate::AppState;

    async fn test_state() -> web::Data<AppState> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let db = Database { pool };
        db.run_migrations().await.unwrap();

        web::Data::new(AppState { db })
    }

    macro_rules! test_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state.clone())
                    .service(web::scope("/api").configure(crate::routes::create_routes)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_create_then_query_by_id() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/tag/create")
            .set_json(serde_json::json!({
                "tagName": "CVE-Critical",
                "description": "High severity"
            }))
            .to_request();
        let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["id"], 1);
        assert_eq!(created["tagName"], "CVE-Critical");
        assert_eq!(created["deleted"], false);

        let req = test::TestRequest::get().uri("/api/tag/query/1").to_request();
        let fetched: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched["id"], 1);
        assert_eq!(fetched["description"], "High severity");
    }

    #[actix_web::test]
    async fn test_duplicate_create_returns_conflict() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/tag/create")
            .set_json(serde_json::json!({"tagName": "X", "description": "d1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/tag/create")
            .set_json(serde_json::json!({"tagName": "X", "description": "d2"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["detail"].as_str().unwrap().contains("already exists"));
    }

    #[actix_web::test]
    async fn test_empty_name_returns_bad_request() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/tag/create")
            .set_json(serde_json::json!({"tagName": "   "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_delete_hides_tag_from_list_and_name_lookup() {
        let state = test_state().await;
        let app = test_app!(state);

        for name in ["A", "B"] {
            let req = test::TestRequest::post()
                .uri("/api/tag/create")
                .set_json(serde_json::json!({"tagName": name}))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::delete()
            .uri("/api/tag/delete/1")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/tag/list").to_request();
        let tags: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0]["id"], 2);

        let req = test::TestRequest::get()
            .uri("/api/tag/queryByName?tagName=A")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        // Deleted tag is still visible by id
        let req = test::TestRequest::get().uri("/api/tag/query/1").to_request();
        let tag: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(tag["deleted"], true);
    }

    #[actix_web::test]
    async fn test_update_round_trip() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/tag/create")
            .set_json(serde_json::json!({"tagName": "Old", "description": "before"}))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/tag/update")
            .set_json(serde_json::json!({
                "id": 1,
                "tagName": "New",
                "description": "after"
            }))
            .to_request();
        let updated: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["id"], 1);
        assert_eq!(updated["tagName"], "New");
        assert_eq!(updated["description"], "after");

        let req = test::TestRequest::get()
            .uri("/api/tag/queryByName?tagName=New")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_query_by_name_missing_returns_not_found() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri("/api/tag/queryByName?tagName=missing")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_malformed_body_rejected_before_store() {
        let state = test_state().await;
        let app = test_app!(state);

        // Missing required tagName field
        let req = test::TestRequest::post()
            .uri("/api/tag/create")
            .set_json(serde_json::json!({"description": "no name"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
