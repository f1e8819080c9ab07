mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn movie_lifecycle_with_optimistic_concurrency() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = server.login_as("editor@example.com").await?;

    let res = server.create_movie(&token, &common::sample_movie()).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers()[header::LOCATION].to_str()?.to_string();
    let created: Value = res.json().await?;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(location, format!("/movies/{id}"));
    assert_eq!(created["version"], 1);

    let res = server
        .client
        .patch(server.url(&location))
        .json(&json!({ "runtime": 97 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["version"], 2);
    assert_eq!(updated["runtime"], 97);
    assert_eq!(updated["title"], "Up");

    let res = server
        .client
        .patch(server.url(&location))
        .json(&json!({ "runtime": 98, "version": 1 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await?;
    assert!(body["message"].as_str().unwrap().contains("Conflicting change"));

    let res = server.client.get(server.url(&location)).send().await?;
    let current: Value = res.json().await?;
    assert_eq!(current["runtime"], 97);
    assert_eq!(current["version"], 2);
    Ok(())
}

#[tokio::test]
async fn unchanged_patch_still_bumps_version() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = server.login_as("editor@example.com").await?;
    let created: Value = server.create_movie(&token, &common::sample_movie()).await?.json().await?;
    let id = created["id"].as_i64().unwrap();

    let res = server
        .client
        .patch(server.url(&format!("/movies/{id}")))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["version"], 2);
    Ok(())
}

#[tokio::test]
async fn delete_then_get_is_not_found() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = server.login_as("editor@example.com").await?;
    let created: Value = server.create_movie(&token, &common::sample_movie()).await?.json().await?;
    let path = format!("/movies/{}", created["id"]);

    let res = server.client.delete(server.url(&path)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(res.bytes().await?.is_empty());

    let res = server.client.get(server.url(&path)).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], format!("Movie with id={} is not found.", created["id"]));

    let res = server.client.delete(server.url(&path)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .patch(server.url(&path))
        .json(&json!({ "runtime": 100 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn invalid_movie_reports_fields() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = server.login_as("editor@example.com").await?;

    let res = server
        .create_movie(&token, &json!({ "title": "", "runtime": -1, "genres": [] }))
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Movie is invalid.");
    for field in ["title", "release_date", "runtime", "genres"] {
        assert!(body["invalid_fields"][field].is_string(), "missing {field}");
    }

    let res = server
        .create_movie(&token, &json!({ "title": "Up", "budget": 175000000 }))
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "JSON body contains unknown key \"budget\".");
    Ok(())
}

#[tokio::test]
async fn invalid_patch_leaves_movie_untouched() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = server.login_as("editor@example.com").await?;
    let created: Value = server.create_movie(&token, &common::sample_movie()).await?.json().await?;
    let path = format!("/movies/{}", created["id"]);

    let res = server
        .client
        .patch(server.url(&path))
        .json(&json!({ "genres": ["a", "b", "c", "d", "e", "f"] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let current: Value = server.client.get(server.url(&path)).send().await?.json().await?;
    assert_eq!(current, created);
    Ok(())
}

#[tokio::test]
async fn malformed_ids_are_invalid() -> Result<()> {
    let server = common::ensure_server().await?;
    for id in ["abc", "-3"] {
        let res = server.client.get(server.url(&format!("/movies/{id}"))).send().await?;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY, "id {id}");
    }
    Ok(())
}

#[tokio::test]
async fn list_filters_sorts_and_pages() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = server.login_as("editor@example.com").await?;

    for (title, runtime, genres) in [
        ("Casablanca", 102, vec!["drama", "romance"]),
        ("Alien", 117, vec!["horror", "sci-fi"]),
        ("Heat", 170, vec!["crime", "drama"]),
    ] {
        let res = server
            .create_movie(
                &token,
                &json!({ "title": title, "release_date": "1990-01-01", "runtime": runtime, "genres": genres }),
            )
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let titles = |movies: Value| -> Vec<String> {
        movies
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["title"].as_str().unwrap().to_string())
            .collect()
    };

    let res = server.client.get(server.url("/movies?genres=drama")).send().await?;
    assert_eq!(titles(res.json().await?), vec!["Casablanca", "Heat"]);

    let res = server.client.get(server.url("/movies?title=ALIEN")).send().await?;
    assert_eq!(titles(res.json().await?), vec!["Alien"]);

    let res = server
        .client
        .get(server.url("/movies?sort=-runtime&page_size=2&page=1"))
        .send()
        .await?;
    assert_eq!(titles(res.json().await?), vec!["Heat", "Alien"]);

    let res = server
        .client
        .get(server.url("/movies?sort=-runtime&page_size=2&page=2"))
        .send()
        .await?;
    assert_eq!(titles(res.json().await?), vec!["Casablanca"]);
    Ok(())
}

#[tokio::test]
async fn list_rejects_bad_parameters() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = server
        .client
        .get(server.url("/movies?page=0&page_size=500&sort=budget"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await?;
    for field in ["page", "page_size", "sort"] {
        assert!(body["invalid_fields"][field].is_string(), "missing {field}");
    }

    let res = server.client.get(server.url("/movies?page=two")).send().await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}
