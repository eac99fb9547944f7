use crate::helpers::test_app::TestApp;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn_app().await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/health", app.base_address))
        .send()
        .await
        .expect("Failed to execute the health request.");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "healthy");
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_text() {
    let app = TestApp::spawn_app().await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/metrics", app.base_address))
        .send()
        .await
        .expect("Failed to execute the metrics request.");

    assert!(response.status().is_success());
}
