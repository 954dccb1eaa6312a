mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn create_and_list_roundtrip() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let (token, _user) = common::register_user(&client, &server).await?;

    let res = client
        .post(format!("{}/api/parents", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Margaret",
            "relationship": "grandmother",
            "age": 72,
            "birthDate": "1953-04-12",
            "personality": ["warm", "stubborn"],
            "interests": ["gardening"],
            "communicationStyle": "phone"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = res.json::<Value>().await?;
    let parent = created.get("parent").expect("parent in response");
    assert_eq!(parent.get("name").and_then(Value::as_str), Some("Margaret"));
    assert_eq!(
        parent.get("relationship").and_then(Value::as_str),
        Some("grandmother")
    );
    assert_eq!(
        parent.get("birthDate").and_then(Value::as_str),
        Some("1953-04-12")
    );
    assert_eq!(
        parent.get("personality"),
        Some(&json!(["warm", "stubborn"]))
    );

    let list = client
        .get(format!("{}/api/parents", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(list.status(), StatusCode::OK);
    let body = list.json::<Value>().await?;
    let parents = body
        .get("parents")
        .and_then(Value::as_array)
        .expect("parents array");
    assert!(parents
        .iter()
        .any(|p| p.get("id") == parent.get("id")));
    Ok(())
}

#[tokio::test]
async fn create_requires_name_and_relationship() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let (token, _user) = common::register_user(&client, &server).await?;

    let res = client
        .post(format!("{}/api/parents", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "age": 50 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert!(body.pointer("/fieldErrors/name").is_some());
    assert!(body.pointer("/fieldErrors/relationship").is_some());
    Ok(())
}

#[tokio::test]
async fn create_rejects_unknown_relationship() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let (token, _user) = common::register_user(&client, &server).await?;

    let res = client
        .post(format!("{}/api/parents", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "X", "relationship": "uncle" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert!(body.pointer("/fieldErrors/relationship").is_some());
    Ok(())
}

#[tokio::test]
async fn age_is_bounded_inclusive() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let (token, _user) = common::register_user(&client, &server).await?;

    for (age, expected) in [
        (0, StatusCode::BAD_REQUEST),
        (1, StatusCode::CREATED),
        (150, StatusCode::CREATED),
        (151, StatusCode::BAD_REQUEST),
    ] {
        let res = client
            .post(format!("{}/api/parents", server.base_url))
            .bearer_auth(&token)
            .json(&json!({ "name": "Age Case", "relationship": "dad", "age": age }))
            .send()
            .await?;
        assert_eq!(res.status(), expected, "age {}", age);
    }
    Ok(())
}

#[tokio::test]
async fn tag_lists_default_to_empty() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let (token, _user) = common::register_user(&client, &server).await?;

    let parent = common::create_parent(&client, &server, &token, "No Tags").await?;
    assert_eq!(parent.get("personality"), Some(&json!([])));
    assert_eq!(parent.get("interests"), Some(&json!([])));
    assert_eq!(parent.get("challenges"), Some(&json!([])));
    assert_eq!(parent.get("goals"), Some(&json!([])));
    Ok(())
}

#[tokio::test]
async fn ownership_misses_are_uniform_404s() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let (owner_token, _) = common::register_user(&client, &server).await?;
    let (other_token, _) = common::register_user(&client, &server).await?;

    let parent = common::create_parent(&client, &server, &owner_token, "Private").await?;
    let parent_id = common::id_of(&parent);

    // Someone else's parent, a random id, and a malformed id all read the same
    let cross_user = client
        .get(format!("{}/api/parents/{}", server.base_url, parent_id))
        .bearer_auth(&other_token)
        .send()
        .await?;
    assert_eq!(cross_user.status(), StatusCode::NOT_FOUND);
    let cross_body = cross_user.json::<Value>().await?;

    let missing = client
        .get(format!(
            "{}/api/parents/{}",
            server.base_url,
            uuid::Uuid::new_v4()
        ))
        .bearer_auth(&other_token)
        .send()
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let missing_body = missing.json::<Value>().await?;

    let malformed = client
        .get(format!("{}/api/parents/not-a-uuid", server.base_url))
        .bearer_auth(&other_token)
        .send()
        .await?;
    assert_eq!(malformed.status(), StatusCode::NOT_FOUND);
    let malformed_body = malformed.json::<Value>().await?;

    assert_eq!(cross_body.get("message"), missing_body.get("message"));
    assert_eq!(cross_body.get("message"), malformed_body.get("message"));
    Ok(())
}

#[tokio::test]
async fn update_patches_only_named_fields() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let (token, _user) = common::register_user(&client, &server).await?;

    let parent = common::create_parent(&client, &server, &token, "Before").await?;
    let parent_id = common::id_of(&parent);

    let res = client
        .put(format!("{}/api/parents/{}", server.base_url, parent_id))
        .bearer_auth(&token)
        .json(&json!({ "name": "After", "goals": ["call weekly"] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    let updated = body.get("parent").expect("parent in response");
    assert_eq!(updated.get("name").and_then(Value::as_str), Some("After"));
    assert_eq!(updated.get("goals"), Some(&json!(["call weekly"])));
    // Untouched fields survive the patch
    assert_eq!(
        updated.get("relationship").and_then(Value::as_str),
        Some("mom")
    );
    Ok(())
}

#[tokio::test]
async fn update_with_no_recognized_fields_is_rejected() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let (token, _user) = common::register_user(&client, &server).await?;

    let parent = common::create_parent(&client, &server, &token, "Stuck").await?;
    let parent_id = common::id_of(&parent);

    let res = client
        .put(format!("{}/api/parents/{}", server.base_url, parent_id))
        .bearer_auth(&token)
        .json(&json!({ "unknownField": "ignored" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn delete_removes_the_parent() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let (token, _user) = common::register_user(&client, &server).await?;

    let parent = common::create_parent(&client, &server, &token, "Short Lived").await?;
    let parent_id = common::id_of(&parent);

    let del = client
        .delete(format!("{}/api/parents/{}", server.base_url, parent_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(del.status(), StatusCode::OK);

    let after = client
        .get(format!("{}/api/parents/{}", server.base_url, parent_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(after.status(), StatusCode::NOT_FOUND);
    Ok(())
}
