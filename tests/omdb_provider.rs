use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cinescope::{
    cache::{QueryCache, RetryPolicy},
    error::AppError,
    models::{MediaType, SearchQuery},
    services::providers::{FetchPolicy, MovieProvider, OmdbProvider},
};

fn provider_for(server: &MockServer, retries: u32) -> OmdbProvider {
    OmdbProvider::new(
        QueryCache::new(
            Duration::from_secs(600),
            RetryPolicy::new(retries, Duration::from_millis(1)),
        ),
        Some("test-key".to_string()),
        server.uri(),
    )
}

fn batman_page() -> serde_json::Value {
    json!({
        "Search": [
            {
                "Title": "Batman Begins",
                "Year": "2005",
                "imdbID": "tt0372784",
                "Type": "movie",
                "Poster": "https://example.com/begins.jpg"
            },
            {
                "Title": "Batman: The Animated Series",
                "Year": "1992–1995",
                "imdbID": "tt0103359",
                "Type": "series",
                "Poster": "N/A"
            }
        ],
        "totalResults": "23",
        "Response": "True"
    })
}

#[tokio::test]
async fn test_search_page_parses_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("s", "batman"))
        .and(query_param("apikey", "test-key"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(batman_page()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server, 0);
    let page = provider
        .search_page(&SearchQuery::new("batman"), 2, FetchPolicy::CacheFirst)
        .await
        .unwrap();

    assert!(page.success);
    assert_eq!(page.total_results, 23);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].id, "tt0372784");
    assert_eq!(page.items[1].media_type, MediaType::Series);
}

#[tokio::test]
async fn test_year_is_sent_when_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("s", "batman"))
        .and(query_param("y", "1989"))
        .respond_with(ResponseTemplate::new(200).set_body_json(batman_page()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server, 0);
    let page = provider
        .search_page(
            &SearchQuery::new("batman").with_year("1989"),
            1,
            FetchPolicy::CacheFirst,
        )
        .await
        .unwrap();

    assert!(page.success);
}

#[tokio::test]
async fn test_response_false_is_unsuccessful_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": "False",
            "Error": "Movie not found!"
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server, 0);
    let page = provider
        .search_page(&SearchQuery::new("qqqzzz"), 1, FetchPolicy::CacheFirst)
        .await
        .unwrap();

    assert!(!page.success);
    assert!(page.items.is_empty());
    assert_eq!(page.error_message.as_deref(), Some("Movie not found!"));
}

#[tokio::test]
async fn test_repeated_search_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("s", "batman"))
        .respond_with(ResponseTemplate::new(200).set_body_json(batman_page()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server, 0);
    let query = SearchQuery::new("batman");
    let first = provider
        .search_page(&query, 1, FetchPolicy::CacheFirst)
        .await
        .unwrap();
    // genre does not take part in the cache key
    let second = provider
        .search_page(&query.clone().with_genre("Action"), 1, FetchPolicy::CacheFirst)
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_concurrent_searches_share_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(batman_page())
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server, 0);
    let query = SearchQuery::new("batman");
    let (a, b) = tokio::join!(
        provider.search_page(&query, 1, FetchPolicy::CacheFirst),
        provider.search_page(&query, 1, FetchPolicy::CacheFirst),
    );

    assert_eq!(a.unwrap(), b.unwrap());
}

#[tokio::test]
async fn test_detail_maps_genre_and_placeholders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("i", "tt0372784"))
        .and(query_param("plot", "full"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Title": "Batman Begins",
            "Year": "2005",
            "Rated": "PG-13",
            "Genre": "Action, Crime, Drama",
            "Director": "Christopher Nolan",
            "Plot": "After witnessing his parents' death...",
            "Poster": "https://example.com/begins.jpg",
            "Ratings": [
                { "Source": "Internet Movie Database", "Value": "8.2/10" }
            ],
            "BoxOffice": "N/A",
            "imdbID": "tt0372784",
            "Type": "movie",
            "Response": "True"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server, 0);
    let detail = provider.fetch_detail("tt0372784").await.unwrap();

    assert_eq!(detail.summary.title, "Batman Begins");
    assert!(detail.has_genre("crime"));
    assert_eq!(detail.director.as_deref(), Some("Christopher Nolan"));
    assert_eq!(detail.box_office, None);
    assert_eq!(detail.ratings.len(), 1);

    // second lookup is cached
    provider.fetch_detail("tt0372784").await.unwrap();
}

#[tokio::test]
async fn test_unknown_detail_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": "False",
            "Error": "Incorrect IMDb ID."
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server, 2);
    let result = provider.fetch_detail("tt0000000").await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_server_errors_are_retried_then_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let provider = provider_for(&server, 2);
    let query = SearchQuery::new("heat");

    let first = provider.search_page(&query, 1, FetchPolicy::CacheFirst).await;
    assert!(matches!(first, Err(AppError::ExternalApi(_))));

    let second = provider.search_page(&query, 1, FetchPolicy::CacheFirst).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_refresh_bypasses_cached_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(batman_page()))
        .mount(&server)
        .await;

    let provider = provider_for(&server, 0);
    let query = SearchQuery::new("batman");

    let failed = provider.search_page(&query, 1, FetchPolicy::CacheFirst).await;
    assert!(failed.is_err());
    assert!(provider
        .search_page(&query, 1, FetchPolicy::CacheFirst)
        .await
        .is_err());

    let page = provider
        .search_page(&query, 1, FetchPolicy::Refresh)
        .await
        .unwrap();
    assert_eq!(page.total_results, 23);
}

#[tokio::test]
async fn test_rejected_key_is_configuration_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "Response": "False",
            "Error": "Invalid API key!"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server, 3);
    let result = provider
        .search_page(&SearchQuery::new("batman"), 1, FetchPolicy::CacheFirst)
        .await;

    assert!(matches!(result, Err(AppError::Configuration(_))));
}
