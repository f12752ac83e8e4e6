//! End-to-end tests of endpoint registration against a mock server.

use api_factory::response::{JsonFormat, PlainTextFormat};
use api_factory::{
    ApiClient, ApiError, BeforeRequest, ClientConfig, ContentKind, EndpointSpec, MultipartForm,
    Payload, RequestConfig, RestMethod, UrlTemplate, ValidationError,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, PartialEq, serde::Deserialize, serde::Serialize)]
struct User {
    id: u64,
    name: String,
}

async fn client(server: &MockServer, context: &str) -> ApiClient {
    let config = ClientConfig::builder(format!("{}{context}", server.uri()))
        .build()
        .unwrap();
    ApiClient::with_defaults(config).unwrap()
}

#[tokio::test]
async fn test_registry_all_composes_urls_and_methods() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ctx/user/all"))
        .respond_with(ResponseTemplate::new(200).set_body_string("everyone"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ctx/user/save"))
        .and(body_json(json!({"name": "ann"})))
        .respond_with(ResponseTemplate::new(201).set_body_string("saved"))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, "/ctx").await;
    let user = api
        .registry_all(
            "/user",
            RestMethod::Get,
            [
                ("all", EndpointSpec::from("/all")),
                ("save", EndpointSpec::detailed("save").method(RestMethod::Post)),
            ],
            RequestConfig::new(),
        )
        .unwrap();

    assert_eq!(user.names(), vec!["all", "save"]);
    assert_eq!(user["all"].url(), format!("{}/ctx/user/all", server.uri()));

    let all = user["all"].fetch::<PlainTextFormat>(None, None).await.unwrap();
    assert_eq!(all, "everyone");

    let saved = user["save"]
        .call(Some(json!({"name": "ann"}).into()), None)
        .await
        .unwrap();
    assert_eq!(saved, "saved");
}

#[tokio::test]
async fn test_registry_all_detailed_options_overlay_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/update"))
        .and(header("x-group", "defaults"))
        .and(header("x-entry", "update"))
        .and(query_param("lang", "en"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, "").await;
    let apis = json!({
        "update": {"url": "/update", "headers": {"X-Group": "defaults", "X-Entry": "update"}}
    });
    let user = api
        .registry_all_from_value(
            "/user",
            RestMethod::Get,
            &apis,
            RequestConfig::new().header("X-Group", "ignored").param("lang", "en"),
        )
        .unwrap();

    user["update"].call(None, None).await.unwrap();
}

#[tokio::test]
async fn test_get_sends_data_as_query_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "2"))
        .and(query_param("q", "ann"))
        .and(query_param("lang", "en"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, "").await;
    let search = api.get("/search", RequestConfig::new().param("lang", "en").data_field("page", 1));

    search
        .call(
            Some(json!({"q": "ann"}).into()),
            Some(RequestConfig::new().data_field("page", 2)),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_post_merges_data_over_presets() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(query_param("v", "2"))
        .and(body_json(json!({"role": "admin", "name": "ann"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(User {
            id: 1,
            name: "ann".to_string(),
        }))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, "").await;
    let create = api.post(
        "/users",
        RequestConfig::new().param("v", 2).data_field("role", "user"),
    );

    let user = create
        .fetch::<JsonFormat<User>>(
            Some(json!({"role": "admin", "name": "ann"}).into()),
            None,
        )
        .await
        .unwrap();
    assert_eq!(user, User { id: 1, name: "ann".to_string() });
}

#[tokio::test]
async fn test_form_content_type_encodes_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("user=ann&pass=s3cret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, "").await;
    let login = api.post("/login", RequestConfig::new().content_type(ContentKind::Form));

    login
        .call(Some(json!({"user": "ann", "pass": "s3cret"}).into()), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_multipart_body_is_sent_as_is() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, "").await;
    let upload = api.post(
        "/upload",
        RequestConfig::new()
            .content_type(ContentKind::Form)
            .data_field("ignored", true),
    );
    let form = MultipartForm::builder()
        .text("title", "report")
        .file("file", "report.txt", Some("text/plain"), "contents")
        .build();

    upload
        .call(Some(Payload::Multipart(form)), None)
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&received[0].body);
    assert!(body.contains("name=\"title\""));
    assert!(body.contains("filename=\"report.txt\""));
    assert!(!body.contains("ignored"));
}

#[tokio::test]
async fn test_path_placeholders_and_builders() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/users/42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let api = client(&server, "").await;
    api.del("/users/{id}", RequestConfig::new())
        .call_with(&[("id", "42")], None, None)
        .await
        .unwrap();
    api.delete(
        UrlTemplate::builder(|args| format!("users/{}", args[0].1)),
        RequestConfig::new(),
    )
    .call_with(&[("id", "42")], None, None)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_sub_factory_requests_nested_path() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/context-path/user/profile"))
        .and(header("x-app", "factory"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::builder(format!("{}/context-path", server.uri()))
        .header("X-App", "factory")
        .build()
        .unwrap();
    let api = ApiClient::new(config).unwrap();
    let user = api.sub_factory("/user").unwrap();

    user.put("profile", RequestConfig::new())
        .call(Some(json!({"bio": "hi"}).into()), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_async_hook_runs_before_send() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/me"))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::builder(server.uri())
        .extra("auth", "bearer")
        .before_request(BeforeRequest::future(|mut options, _ctx| async move {
            tokio::task::yield_now().await;
            if options.extra.get("auth") == Some(&json!("bearer")) {
                options.set_header("Authorization", "Bearer fresh-token");
            }
            Ok(options)
        }))
        .build()
        .unwrap();
    let api = ApiClient::with_defaults(config).unwrap();

    api.patch("/me", RequestConfig::new())
        .call(None, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_invalid_body_is_validation_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let api = client(&server, "").await;
    let result = api
        .get("/users/1", RequestConfig::new())
        .fetch::<JsonFormat<User>>(None, None)
        .await;

    assert!(matches!(
        result,
        Err(ApiError::Validation(ValidationError::JsonParse(_)))
    ));
}

#[tokio::test]
async fn test_url_factory_does_not_send() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = client(&server, "/files").await;
    let download = api.url_factory("/download");
    let params = json!({"id": 7});

    assert_eq!(
        download.url(params.as_object()),
        format!("{}/files/download?id=7", server.uri())
    );
}
