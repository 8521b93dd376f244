//! Tags and commits through the filesystem handle.

use std::sync::Arc;

use bbfs_rs::caches::CacheConfig;
use bbfs_rs::client::{Client, ClientError, MemoryTransport, PageCursor, SecretString, Transport};
use bbfs_rs::fs::{FsError, RepoFs};

const BASE: &str = "https://bitbucket.example.com/rest/api/latest";
const REPO: &str = "https://bitbucket.example.com/rest/api/latest/projects/P/repos/R";

fn setup() -> (Arc<MemoryTransport>, RepoFs) {
    let transport = Arc::new(MemoryTransport::new());
    let client = Client::with_transport(
        BASE,
        SecretString::new("token"),
        &CacheConfig::default(),
        Arc::clone(&transport) as Arc<dyn Transport>,
    )
    .unwrap();
    let fs = RepoFs::with_client(Arc::new(client), "P", "R").with_page_size(2);
    (transport, fs)
}

fn tag(name: &str, commit: &str) -> String {
    format!(
        r#"{{"id":"refs/tags/{name}","displayId":"{name}","latestCommit":"{commit}","type":"TAG"}}"#
    )
}

#[tokio::test]
async fn test_tags_follow_every_page() {
    let (transport, fs) = setup();
    transport.respond(
        format!("{REPO}/tags?orderBy=MODIFICATION&limit=2"),
        format!(
            r#"{{"size":2,"limit":2,"start":0,"isLastPage":false,"nextPageStart":2,"values":[{},{}]}}"#,
            tag("v1.2", "c3"),
            tag("v1.1", "c2")
        ),
    );
    transport.respond(
        format!("{REPO}/tags?orderBy=MODIFICATION&start=2&limit=2"),
        format!(
            r#"{{"size":1,"limit":2,"start":2,"isLastPage":true,"values":[{}]}}"#,
            tag("v1.0", "c1")
        ),
    );

    let tags = fs.tags("MODIFICATION").await.unwrap();

    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["v1.2", "v1.1", "v1.0"]);
    assert_eq!(tags[2].id, "refs/tags/v1.0");
    assert_eq!(tags[2].commit_id, "c1");
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn test_tags_error_is_reported() {
    let (transport, fs) = setup();
    transport.fail(
        format!("{REPO}/tags?orderBy=ALPHABETICAL&limit=2"),
        "connection refused",
    );

    let err = fs.tags("ALPHABETICAL").await.unwrap_err();
    assert!(matches!(
        err,
        FsError::Client {
            op: "tags",
            source: ClientError::Transport { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_commits_page() {
    let (transport, fs) = setup();
    transport.respond(
        format!("{REPO}/commits?orderBy=NEWEST&start=10&limit=2"),
        r#"{"size":2,"limit":2,"start":10,"isLastPage":false,"nextPageStart":12,"values":[
            {"id":"c12","author":{"name":"Ann","emailAddress":"ann@example.com"},"authorTimestamp":1700000000000,"message":"twelve"},
            {"id":"c11","author":{"name":"Bob","emailAddress":"bob@example.com"},"authorTimestamp":1690000000000,"message":"eleven"}
        ]}"#,
    );

    let page = fs
        .commits("NEWEST", PageCursor { start: 10, limit: 2 })
        .await
        .unwrap();

    assert_eq!(page.commits.len(), 2);
    assert_eq!(page.commits[0].id, "c12");
    assert_eq!(page.commits[1].author.name, "Bob");
    assert_eq!(
        page.page.next_cursor(PageCursor { start: 10, limit: 2 }),
        Some(PageCursor { start: 12, limit: 2 })
    );
}

#[tokio::test]
async fn test_single_commit() {
    let (transport, fs) = setup();
    transport.respond(
        format!("{REPO}/commits/def456"),
        r#"{"id":"def456","author":{"name":"Ann","emailAddress":"ann@example.com"},"authorTimestamp":1700000000000,"committer":{"name":"Ann"},"committerTimestamp":1700000000000,"message":"fix listing"}"#,
    );

    let commit = fs.commit("def456").await.unwrap();
    assert_eq!(commit.id, "def456");
    assert_eq!(commit.message, "fix listing");
    assert_eq!(commit.author_timestamp.timestamp(), 1_700_000_000);
}

#[tokio::test]
async fn test_missing_commit_is_a_status_error() {
    let (_transport, fs) = setup();
    let err = fs.commit("nope").await.unwrap_err();
    match err {
        FsError::Client { source, .. } => assert!(source.is_not_found()),
        other => panic!("unexpected error {:?}", other),
    }
}
