//! HTTP client tests against a mock object store service

use bytes::Bytes;
use std::time::Duration;
use cosfs_client::{ClientConfig, ClientError, CopySource, CosClient, ListRequest, ObjectStore};
use wiremock::matchers::{body_bytes, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> CosClient {
    CosClient::new(ClientConfig::new(server.uri())).unwrap()
}

#[test_log::test(tokio::test)]
async fn test_head_object_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/bucket/dir/file.csv"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Last-Modified", "Mon, 01 Jan 2024 10:20:30 GMT")
                .insert_header("ETag", "\"abc123\""),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let meta = client.head_object("bucket", "dir/file.csv").await.unwrap();
    assert_eq!(meta.last_modified.as_deref(), Some("Mon, 01 Jan 2024 10:20:30 GMT"));
    assert_eq!(meta.etag, "abc123");
}

#[tokio::test]
async fn test_head_missing_object_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.head_object("bucket", "missing").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound { ref key, .. } if key == "missing"));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_ranged_get_sends_range_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bucket/file"))
        .and(header("Range", "bytes=2-5"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(b"cdef".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let data = client.get_object_range("bucket", "file", 2, 4).await.unwrap();
    assert_eq!(data.as_ref(), b"cdef");
}

#[tokio::test]
async fn test_ranged_get_past_end_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(416).set_body_string(
            "<Error><Code>InvalidRange</Code><Message>The requested range is not satisfiable</Message></Error>",
        ))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.get_object_range("bucket", "file", 100, 4).await.unwrap_err();
    assert_eq!(err.code(), "InvalidRange");
}

#[tokio::test]
async fn test_put_object_uploads_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/bucket/dir/"))
        .and(body_bytes(Vec::new()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.put_object("bucket", "dir/", Bytes::new()).await.unwrap();
}

#[tokio::test]
async fn test_list_objects_query_and_parse() {
    let server = MockServer::start().await;
    let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult>
    <Name>bucket</Name>
    <Prefix>base/</Prefix>
    <MaxKeys>1000</MaxKeys>
    <Delimiter>/</Delimiter>
    <IsTruncated>false</IsTruncated>
    <Contents><Key>base/TestFile.csv</Key><Size>4</Size></Contents>
    <CommonPrefixes><Prefix>base/SubDir/</Prefix></CommonPrefixes>
</ListBucketResult>"#;
    Mock::given(method("GET"))
        .and(path("/bucket"))
        .and(query_param("prefix", "base/"))
        .and(query_param("delimiter", "/"))
        .and(query_param("max-keys", "1000"))
        .and(query_param("marker", "base/A"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let request = ListRequest::new("base/")
        .with_delimiter("/")
        .with_marker(Some("base/A".to_string()));
    let page = client.list_objects("bucket", &request).await.unwrap();

    assert!(!page.is_truncated);
    assert_eq!(page.contents.len(), 1);
    assert_eq!(page.contents[0].key, "base/TestFile.csv");
    assert_eq!(page.common_prefixes, vec!["base/SubDir/".to_string()]);
}

#[tokio::test]
async fn test_copy_object_sends_source_header() {
    let server = MockServer::start().await;
    let source = format!("{}/src-bucket/dir/a.txt", server.address());
    Mock::given(method("PUT"))
        .and(path("/dst-bucket/dir/b.txt"))
        .and(header("x-cos-copy-source", source.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<CopyObjectResult><ETag>\"abc\"</ETag></CopyObjectResult>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client
        .copy_object(&CopySource::new("src-bucket", "dir/a.txt"), "dst-bucket", "dir/b.txt")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_copy_object_error_in_ok_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<Error><Code>InternalError</Code><Message>copy failed</Message></Error>",
        ))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .copy_object(&CopySource::new("b", "a"), "b", "c")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "InternalError");
    assert_eq!(err.message(), "copy failed");
}

#[tokio::test]
async fn test_service_error_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(403).set_body_string(
            "<Error><Code>AccessDenied</Code><Message>Access Denied.</Message><RequestId>r-1</RequestId></Error>",
        ))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.delete_object("bucket", "k").await.unwrap_err();
    match err {
        ClientError::Service { code, message, request_id } => {
            assert_eq!(code, "AccessDenied");
            assert_eq!(message, "Access Denied.");
            assert_eq!(request_id.as_deref(), Some("r-1"));
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_bucket_exists() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/present"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/absent"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert!(client.bucket_exists("present").await.unwrap());
    assert!(!client.bucket_exists("absent").await.unwrap());
}

#[tokio::test]
async fn test_configured_client_sends_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bucket/file"))
        .and(header("Authorization", "q-sign-algorithm=sha1&q-signature=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new(server.uri())
        .with_region("ap-shanghai")
        .with_credentials("AKID", "secret")
        .with_token("q-sign-algorithm=sha1&q-signature=abc")
        .with_timeout(Duration::from_secs(5));
    let client = CosClient::new(config).unwrap();
    assert_eq!(client.config().region, "ap-shanghai");
    assert_eq!(client.config().access_key.as_deref(), Some("AKID"));
    assert_eq!(client.config().secret_key.as_deref(), Some("secret"));
    assert_eq!(client.config().timeout, Duration::from_secs(5));

    let data = client.get_object_range("bucket", "file", 0, 2).await.unwrap();
    assert_eq!(data.as_ref(), b"ok");
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = ClientConfig::new(server.uri()).with_timeout(Duration::from_millis(100));
    let client = CosClient::new(config).unwrap();
    let err = client.head_object("bucket", "slow").await.unwrap_err();
    assert!(matches!(err, ClientError::Http(ref e) if e.is_timeout()));
}

#[tokio::test]
async fn test_endpoint_client_lists_at_least_one_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bucket"))
        .and(query_param("max-keys", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<ListBucketResult><IsTruncated>false</IsTruncated></ListBucketResult>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = CosClient::with_endpoint(&server.uri()).unwrap();
    assert_eq!(client.config().endpoint, server.uri());
    let mut request = ListRequest::new("");
    request.max_keys = 0;
    let page = client.list_objects("bucket", &request).await.unwrap();
    assert!(page.contents.is_empty());
}
