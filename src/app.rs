use std::net::SocketAddr;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, foods, images, profile};

pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .merge(auth::router())
        .merge(foods::router())
        .merge(profile::router())
        .merge(images::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::dto::PublicUser,
        session::SessionHolder,
        storage::Bucket,
        testing::{fake_state, food_entry, public_user, user_row},
    };
    use axum::{
        body::{to_bytes, Body},
        extract::FromRef,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn cookie_for(state: &AppState, user: &PublicUser) -> String {
        let saved = SessionHolder::from_ref(state).save(user).unwrap();
        saved.set_cookie.split(';').next().unwrap().to_string()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        req.body(Body::empty()).unwrap()
    }

    async fn json_body(res: Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const BOUNDARY: &str = "food-tracker-boundary";

    fn multipart(uri: &str, cookie: &str, text: &[(&str, &str)], image: Option<(&str, &str)>) -> Request<Body> {
        let mut body = String::new();
        for (name, value) in text {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        if let Some((file_name, content_type)) = image {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\nbytes\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (state, _) = fake_state();
        let res = build_app(state).oneshot(get("/health", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_pages_redirect_to_login_without_session() {
        let (state, _) = fake_state();
        let app = build_app(state);
        for uri in ["/dashboard", "/addfood", "/profile"] {
            let res = app.clone().oneshot(get(uri, None)).await.unwrap();
            assert_eq!(res.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(res.headers()[header::LOCATION], "/login");
        }
    }

    #[tokio::test]
    async fn login_sets_the_session_cookie_and_opens_the_dashboard() {
        let (state, fakes) = fake_state();
        fakes.users.seed(user_row("ann@example.com", "secret"));
        let app = build_app(state);

        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"ann@example.com","password":"secret"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/dashboard");
        let set_cookie = res.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(set_cookie.starts_with("food_tracker_user="));

        let cookie = set_cookie.split(';').next().unwrap().to_string();
        let res = app.oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["user"]["email"], "ann@example.com");
        assert_eq!(body["total"], 0);
        assert_eq!(body["showing_from"], 0);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let (state, fakes) = fake_state();
        fakes.users.seed(user_row("ann@example.com", "secret"));
        let res = build_app(state)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"ann@example.com","password":"nope"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(json_body(res).await["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn dashboard_search_and_page_come_from_the_query() {
        let (state, fakes) = fake_state();
        let user = public_user("Ann");
        for i in 1..=12 {
            fakes.foods.seed(food_entry(user.id, &format!("Salad {i}")));
        }
        let cookie = cookie_for(&state, &user);
        let app = build_app(state);

        let res = app
            .clone()
            .oneshot(get("/dashboard?page=2", Some(&cookie)))
            .await
            .unwrap();
        let body = json_body(res).await;
        assert_eq!(body["page"], 2);
        assert_eq!(body["items"].as_array().unwrap().len(), 2);
        assert_eq!(body["items"][0]["foodname"], "Salad 2");

        let res = app
            .oneshot(get("/dashboard?search=salad%201", Some(&cookie)))
            .await
            .unwrap();
        let body = json_body(res).await;
        assert_eq!(body["page"], 1);
        assert_eq!(body["total"], 4);
        assert!(body["items"][0].get("food_image_path").is_none());
    }

    #[tokio::test]
    async fn add_food_redirects_to_dashboard() {
        let (state, fakes) = fake_state();
        let user = public_user("Ann");
        let cookie = cookie_for(&state, &user);
        let res = build_app(state)
            .oneshot(multipart(
                "/addfood",
                &cookie,
                &[("foodname", "Som tam"), ("meal", "Lunch"), ("fooddate_at", "2025-09-02")],
                Some(("somtam.jpg", "image/jpeg")),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/dashboard");
        assert_eq!(fakes.foods.len(), 1);
        assert_eq!(fakes.storage.uploaded()[0].0, Bucket::FoodImages);
    }

    #[tokio::test]
    async fn add_food_without_image_is_rejected() {
        let (state, fakes) = fake_state();
        let cookie = cookie_for(&state, &public_user("Ann"));
        let res = build_app(state)
            .oneshot(multipart(
                "/addfood",
                &cookie,
                &[("foodname", "Som tam"), ("fooddate_at", "2025-09-02")],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["error"], "Please choose an image");
        assert!(fakes.storage.uploaded().is_empty());
    }

    #[tokio::test]
    async fn search_term_is_matched_as_typed() {
        let (state, fakes) = fake_state();
        let user = public_user("Ann");
        fakes.foods.seed(food_entry(user.id, "Salad"));
        fakes.foods.seed(food_entry(user.id, "Salad 1"));
        let cookie = cookie_for(&state, &user);
        let res = build_app(state)
            .oneshot(get("/dashboard?search=salad%20", Some(&cookie)))
            .await
            .unwrap();
        let body = json_body(res).await;
        assert_eq!(body["search"], "salad ");
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["foodname"], "Salad 1");
    }

    #[tokio::test]
    async fn edit_form_is_prefilled_from_the_owned_entry() {
        let (state, fakes) = fake_state();
        let user = public_user("Ann");
        let entry = food_entry(user.id, "Toast");
        fakes.foods.seed(entry.clone());
        let cookie = cookie_for(&state, &user);
        let res = build_app(state)
            .oneshot(get(&format!("/updatefood/{}", entry.id), Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["id"], entry.id.to_string());
        assert_eq!(body["form"]["foodname"], "Toast");
        assert_eq!(body["form"]["meal"], "Lunch");
        assert_eq!(body["form"]["fooddate_at"], "2025-09-01");
        assert_eq!(body["form"]["food_image_url"], entry.food_image_url);
    }

    #[tokio::test]
    async fn editing_someone_elses_entry_is_forbidden() {
        let (state, fakes) = fake_state();
        let entry = food_entry(public_user("Bob").id, "Toast");
        fakes.foods.seed(entry.clone());
        let cookie = cookie_for(&state, &public_user("Ann"));
        let res = build_app(state)
            .oneshot(get(&format!("/updatefood/{}", entry.id), Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            json_body(res).await["error"],
            "You are not authorized to edit this item."
        );
    }

    #[tokio::test]
    async fn delete_returns_the_removed_id() {
        let (state, fakes) = fake_state();
        let user = public_user("Ann");
        let entry = food_entry(user.id, "Toast");
        fakes.foods.seed(entry.clone());
        let cookie = cookie_for(&state, &user);
        let res = build_app(state)
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri(format!("/dashboard/{}", entry.id))
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["deleted"], entry.id.to_string());
        assert_eq!(body["total"], 0);
        assert_eq!(fakes.foods.len(), 0);
    }

    #[tokio::test]
    async fn logout_clears_the_cookie() {
        let (state, _) = fake_state();
        let res = build_app(state)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/login");
        assert!(res.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));
    }
}
