mod helpers;

use axum::http::StatusCode;
use helpers::{
    body_json, create_ingredient, register_admin, register_user, send, spawn_app,
    spawn_app_with_suggestions,
};
use serde_json::json;

#[tokio::test]
async fn create_and_fetch_recipe() {
    let (app, _pool) = spawn_app().await;
    let (token, user_id) = register_user(&app, "Alice", "alice@example.com").await;
    let flour = create_ingredient(&app, &token, "Flour", "gr").await;

    let response = send(
        &app,
        "POST",
        "/recipes",
        Some(&token),
        Some(json!({
            "title": "Flatbread",
            "ingredients": [{ "ingredientId": flour, "quantity": 300 }],
            "instructions": ["Mix", "Bake"],
            "categories": ["baked"],
            "servings": 4,
            "prepTime": 25,
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let recipe_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["ownerId"], json!(user_id));

    let response = send(&app, "GET", &format!("/recipes/{recipe_id}"), None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], json!("Flatbread"));
    assert_eq!(body["data"]["likesCount"], json!(0));
}

#[tokio::test]
async fn unknown_ingredient_reference_is_rejected() {
    let (app, _pool) = spawn_app().await;
    let (token, _) = register_user(&app, "Alice", "alice@example.com").await;

    let response = send(
        &app,
        "POST",
        "/recipes",
        Some(&token),
        Some(json!({
            "title": "Phantom Soup",
            "ingredients": [{ "ingredientId": "0".repeat(24), "quantity": 1 }],
            "instructions": ["Stir"],
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Unknown ingredient ids"));
}

#[tokio::test]
async fn duplicate_title_is_conflict_case_insensitive() {
    let (app, _pool) = spawn_app().await;
    let (token, _) = register_user(&app, "Alice", "alice@example.com").await;
    let flour = create_ingredient(&app, &token, "Flour", "gr").await;

    let payload = |title: &str| {
        json!({
            "title": title,
            "ingredients": [{ "ingredientId": flour, "quantity": 300 }],
            "instructions": ["Mix"],
        })
    };

    let response = send(&app, "POST", "/recipes", Some(&token), Some(payload("Bread"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "POST", "/recipes", Some(&token), Some(payload("bread"))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn ownership_guard_on_update_and_delete() {
    let (app, _pool) = spawn_app().await;
    let (owner_token, _) = register_user(&app, "Owner", "owner@example.com").await;
    let (stranger_token, _) = register_user(&app, "Stranger", "stranger@example.com").await;
    let flour = create_ingredient(&app, &owner_token, "Flour", "gr").await;

    let response = send(
        &app,
        "POST",
        "/recipes",
        Some(&owner_token),
        Some(json!({
            "title": "Bread",
            "ingredients": [{ "ingredientId": flour, "quantity": 300 }],
            "instructions": ["Mix"],
        })),
    )
    .await;
    let recipe_id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // A stranger can neither update nor delete.
    let response = send(
        &app,
        "PATCH",
        &format!("/recipes/{recipe_id}"),
        Some(&stranger_token),
        Some(json!({ "title": "Stolen Bread" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        "DELETE",
        &format!("/recipes/{recipe_id}"),
        Some(&stranger_token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner can.
    let response = send(
        &app,
        "PATCH",
        &format!("/recipes/{recipe_id}"),
        Some(&owner_token),
        Some(json!({ "title": "Sourdough" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "DELETE",
        &format!("/recipes/{recipe_id}"),
        Some(&owner_token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", &format!("/recipes/{recipe_id}"), None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_can_manage_any_recipe() {
    let (app, pool) = spawn_app().await;
    let (owner_token, _) = register_user(&app, "Owner", "owner@example.com").await;
    let (admin_token, _) = register_admin(&app, &pool, "admin@example.com").await;
    let flour = create_ingredient(&app, &owner_token, "Flour", "gr").await;

    let response = send(
        &app,
        "POST",
        "/recipes",
        Some(&owner_token),
        Some(json!({
            "title": "Bread",
            "ingredients": [{ "ingredientId": flour, "quantity": 300 }],
            "instructions": ["Mix"],
        })),
    )
    .await;
    let recipe_id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send(
        &app,
        "DELETE",
        &format!("/recipes/{recipe_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_recipe_id_is_invalid_input() {
    let (app, _pool) = spawn_app().await;
    let (token, _) = register_user(&app, "Alice", "alice@example.com").await;

    let response = send(&app, "PATCH", "/recipes/not-an-id", Some(&token), Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["kind"], json!("invalid_input"));
}

#[tokio::test]
async fn list_filters_by_category() {
    let (app, _pool) = spawn_app().await;
    let (token, _) = register_user(&app, "Alice", "alice@example.com").await;
    let flour = create_ingredient(&app, &token, "Flour", "gr").await;

    for (title, category) in [("Bread", "baked"), ("Salad", "vegan")] {
        let response = send(
            &app,
            "POST",
            "/recipes",
            Some(&token),
            Some(json!({
                "title": title,
                "ingredients": [{ "ingredientId": flour, "quantity": 1 }],
                "instructions": ["Do it"],
                "categories": [category],
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = send(&app, "GET", "/recipes?category=baked", None, None).await;
    let body = body_json(response).await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Bread"]);
}

#[tokio::test]
async fn like_is_idempotent_and_mirrored() {
    let (app, _pool) = spawn_app().await;
    let (owner_token, _) = register_user(&app, "Owner", "owner@example.com").await;
    let (fan_token, fan_id) = register_user(&app, "Fan", "fan@example.com").await;
    let flour = create_ingredient(&app, &owner_token, "Flour", "gr").await;

    let response = send(
        &app,
        "POST",
        "/recipes",
        Some(&owner_token),
        Some(json!({
            "title": "Bread",
            "ingredients": [{ "ingredientId": flour, "quantity": 300 }],
            "instructions": ["Mix"],
        })),
    )
    .await;
    let recipe_id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Two likes count once.
    for _ in 0..2 {
        let response = send(
            &app,
            "PUT",
            &format!("/recipes/{recipe_id}/like"),
            Some(&fan_token),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["likesCount"], json!(1));
    }

    let response = send(&app, "GET", &format!("/users/{fan_id}"), None, None).await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["savedRecipes"], json!([recipe_id.clone()]));

    // Unlike twice lands back at zero, not below.
    for expected in [0, 0] {
        let response = send(
            &app,
            "DELETE",
            &format!("/recipes/{recipe_id}/like"),
            Some(&fan_token),
            None,
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["data"]["likesCount"], json!(expected));
    }
}

#[tokio::test]
async fn follow_is_idempotent_and_self_follow_rejected() {
    let (app, _pool) = spawn_app().await;
    let (a_token, a_id) = register_user(&app, "A", "a@example.com").await;
    let (_b_token, b_id) = register_user(&app, "B", "b@example.com").await;

    let response = send(
        &app,
        "PUT",
        &format!("/users/{a_id}/follow"),
        Some(&a_token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    for _ in 0..2 {
        let response = send(
            &app,
            "PUT",
            &format!("/users/{b_id}/follow"),
            Some(&a_token),
            None,
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["data"]["followersCount"], json!(1));
    }

    let response = send(&app, "GET", &format!("/users/{b_id}"), None, None).await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["followersCount"], json!(1));

    let response = send(&app, "GET", &format!("/users/{a_id}"), None, None).await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["followingCount"], json!(1));
}

fn canned_suggestion() -> serde_json::Value {
    json!({
        "title": "Simple Eggs",
        "instructions": ["Crack the egg", "Fry it"],
        "ingredients": [{ "name": "Egg", "quantity": 2 }],
        "categories": ["Vegans", "meat-based", "Vegans"],
    })
}

#[tokio::test]
async fn suggested_recipe_is_normalized_and_persisted() {
    let (app, pool) = spawn_app_with_suggestions(vec![canned_suggestion()]).await;
    let (token, user_id) = register_user(&app, "Alice", "alice@example.com").await;

    let response = send(&app, "GET", "/recipes/suggested", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["data"]["title"], json!("Simple Eggs"));
    assert_eq!(body["data"]["ownerId"], json!(user_id));
    assert_eq!(body["data"]["categories"], json!(["vegan", "carnivore"]));
    assert_eq!(body["data"]["servings"], json!(1));
    assert_eq!(body["data"]["prepTime"], json!(30));

    // The missing ingredient got created on the fly.
    let egg = tastebook_db::ingredients::find_by_strict_name(&pool, "egg")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        body["data"]["ingredients"][0]["ingredientId"],
        json!(egg.id)
    );
}

#[tokio::test]
async fn suggestion_quota_is_enforced() {
    let suggestions = (0..4)
        .map(|n| {
            json!({
                "title": format!("Suggestion {n}"),
                "instructions": ["Cook"],
                "ingredients": [{ "name": format!("Ingredient {n}"), "quantity": 1 }],
            })
        })
        .collect();
    let (app, _pool) = spawn_app_with_suggestions(suggestions).await;
    let (token, _) = register_user(&app, "Alice", "alice@example.com").await;

    for _ in 0..3 {
        let response = send(&app, "GET", "/recipes/suggested", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = send(&app, "GET", "/recipes/suggested", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("daily AI suggestion limit"));
}

#[tokio::test]
async fn recent_ops_are_private_and_recorded() {
    let (app, _pool) = spawn_app().await;
    let (token, user_id) = register_user(&app, "Alice", "alice@example.com").await;
    let (other_token, _) = register_user(&app, "Bob", "bob@example.com").await;
    let flour = create_ingredient(&app, &token, "Flour", "gr").await;

    let response = send(
        &app,
        "POST",
        "/recipes",
        Some(&token),
        Some(json!({
            "title": "Bread",
            "ingredients": [{ "ingredientId": flour, "quantity": 300 }],
            "instructions": ["Mix"],
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "GET",
        &format!("/users/{user_id}/recent-ops"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let ops = body["data"].as_array().unwrap();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0]["kind"], json!("create"));
    assert_eq!(ops[0]["resource"], json!("recipe"));

    let response = send(
        &app,
        "GET",
        &format!("/users/{user_id}/recent-ops"),
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn concurrent_ingredient_posts_yield_one_conflict() {
    let (app, pool) = spawn_app().await;
    let (token, _) = register_user(&app, "Alice", "alice@example.com").await;

    let first = send(
        &app,
        "POST",
        "/ingredients",
        Some(&token),
        Some(json!({ "name": "Sea Salt", "unit": "gr" })),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = send(
        &app,
        "POST",
        "/ingredients",
        Some(&token),
        Some(json!({ "name": "sea   salt", "unit": "gr" })),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    assert_eq!(tastebook_db::ingredients::count(&pool).await.unwrap(), 1);
}
