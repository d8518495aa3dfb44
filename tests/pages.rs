mod common;

use axum::http::{StatusCode, header};
use common::spawn_app;
use photofolio::photos::NewPhoto;

fn new_photo(title: &str, url: &str, sort_order: i64) -> NewPhoto {
    NewPhoto {
        title: title.to_string(),
        url: url.to_string(),
        sort_order,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_gallery_lists_photos_in_order() {
    let app = spawn_app().await;
    app.state
        .photos
        .insert(new_photo("Second", "https://cdn.example.com/second.jpg", 2))
        .await
        .unwrap();
    app.state
        .photos
        .insert(new_photo("First", "https://cdn.example.com/first.jpg", 1))
        .await
        .unwrap();

    let response = app.server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let html = response.text();
    assert!(html.contains("<header>Test Portfolio</header>"));
    let first = html.find("alt=\"First\"").unwrap();
    let second = html.find("alt=\"Second\"").unwrap();
    assert!(first < second);
    assert!(html.contains("src=\"https://cdn.example.com/first.jpg\""));
}

#[tokio::test]
async fn test_gallery_routes_share_links_through_proxy() {
    let app = spawn_app().await;
    app.state
        .photos
        .insert(new_photo(
            "Shared",
            "https://www.amazon.com/photos/share/AbC123",
            0,
        ))
        .await
        .unwrap();

    let html = app.server.get("/").await.text();
    assert!(html.contains(
        "src=\"/api/image?url=https%3A%2F%2Fwww.amazon.com%2Fphotos%2Fshare%2FAbC123\""
    ));
}

#[tokio::test]
async fn test_photo_detail_page() {
    let app = spawn_app().await;
    let photo = app
        .state
        .photos
        .insert(NewPhoto {
            description: "Fog over the river.".to_string(),
            tags: Some("fog, river".to_string()),
            ..new_photo("Morning Fog", "https://cdn.example.com/fog.jpg", 0)
        })
        .await
        .unwrap();

    let response = app.server.get(&format!("/photo/{}", photo.id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let html = response.text();
    assert!(html.contains("<h1>Morning Fog</h1>"));
    assert!(html.contains("Fog over the river."));
    assert!(html.contains("<span class=\"tag\">fog</span><span class=\"tag\">river</span>"));
}

#[tokio::test]
async fn test_unknown_photo_is_not_found() {
    let app = spawn_app().await;

    let response = app.server.get("/photo/no-such-photo").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.text(), "Photo not found");
}

#[tokio::test]
async fn test_admin_root_redirects_by_session() {
    let app = spawn_app().await;

    let anonymous = app.server.get("/admin").await;
    assert_eq!(anonymous.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(anonymous.header(header::LOCATION), "/admin/login");

    let cookie = app.login().await;
    let logged_in = app
        .server
        .get("/admin")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(logged_in.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(logged_in.header(header::LOCATION), "/admin/dashboard");
}

#[tokio::test]
async fn test_login_page_renders_or_redirects() {
    let app = spawn_app().await;

    let anonymous = app.server.get("/admin/login").await;
    assert_eq!(anonymous.status_code(), StatusCode::OK);
    assert!(anonymous.text().contains("login-form"));

    let cookie = app.login().await;
    let logged_in = app
        .server
        .get("/admin/login")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(logged_in.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(logged_in.header(header::LOCATION), "/admin/dashboard");
}

#[tokio::test]
async fn test_dashboard_requires_session() {
    let app = spawn_app().await;
    let photo = app
        .state
        .photos
        .insert(new_photo("Listed", "https://cdn.example.com/listed.jpg", 0))
        .await
        .unwrap();

    let anonymous = app.server.get("/admin/dashboard").await;
    assert_eq!(anonymous.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(anonymous.header(header::LOCATION), "/admin/login");

    let cookie = app.login().await;
    let response = app
        .server
        .get("/admin/dashboard")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let html = response.text();
    assert!(html.contains("Signed in as admin"));
    assert!(html.contains(&format!("data-id=\"{}\"", photo.id)));
}
