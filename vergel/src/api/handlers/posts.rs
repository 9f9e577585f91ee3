//! Post endpoints. Reading is public within the authenticated API; updates
//! and deletes are scoped to the owning user and answer 404 otherwise.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        pagination::Pagination,
        posts::{PostCreateRequest, PostResponse, PostUpdateRequest},
        users::CurrentUser,
        MessageResponse,
    },
    db::{
        handlers::{posts::PostFilter, Posts, Repository},
        models::posts::{PostCreateDBRequest, PostUpdateDBRequest},
    },
    errors::Error,
    types::PostId,
    AppState,
};

/// Create a post
#[utoipa::path(
    post,
    path = "/posts",
    request_body = PostCreateRequest,
    tag = "posts",
    responses(
        (status = 201, description = "Post creado", body = PostResponse),
        (status = 400, description = "Datos inválidos"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_post(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<PostCreateRequest>,
) -> Result<(StatusCode, Json<PostResponse>), Error> {
    if request.title.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "El título del post es obligatorio".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let post = Posts::new(&mut tx)
        .create(&PostCreateDBRequest {
            user_id: current_user.id,
            title: request.title,
            content: request.content,
        })
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

/// List posts with pagination
#[utoipa::path(
    get,
    path = "/posts",
    tag = "posts",
    params(Pagination),
    responses(
        (status = 200, description = "Listado de posts", body = [PostResponse]),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_posts(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<PostResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let posts = Posts::new(&mut conn)
        .list(&PostFilter {
            skip: pagination.skip,
            limit: pagination.limit,
        })
        .await?;

    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

/// Fetch one post
#[utoipa::path(
    get,
    path = "/posts/{post_id}",
    tag = "posts",
    params(("post_id" = String, Path, format = "uuid")),
    responses(
        (status = 200, description = "Post", body = PostResponse),
        (status = 404, description = "Post no encontrado"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_post(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(post_id): Path<PostId>,
) -> Result<Json<PostResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let post = Posts::new(&mut conn)
        .get_by_id(post_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Post".to_string(),
        })?;

    Ok(Json(PostResponse::from(post)))
}

/// Update one of the user's posts
#[utoipa::path(
    put,
    path = "/posts/{post_id}",
    request_body = PostUpdateRequest,
    tag = "posts",
    params(("post_id" = String, Path, format = "uuid")),
    responses(
        (status = 200, description = "Post actualizado", body = PostResponse),
        (status = 404, description = "Post no encontrado"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_post(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(post_id): Path<PostId>,
    Json(request): Json<PostUpdateRequest>,
) -> Result<Json<PostResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut posts = Posts::new(&mut tx);
    // Posts owned by someone else are indistinguishable from missing ones
    posts
        .get_for_user(post_id, current_user.id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Post".to_string(),
        })?;

    let updated = posts
        .update(
            post_id,
            &PostUpdateDBRequest {
                title: request.title,
                content: request.content,
            },
        )
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(PostResponse::from(updated)))
}

/// Delete one of the user's posts
#[utoipa::path(
    delete,
    path = "/posts/{post_id}",
    tag = "posts",
    params(("post_id" = String, Path, format = "uuid")),
    responses(
        (status = 200, description = "Post eliminado", body = MessageResponse),
        (status = 404, description = "Post no encontrado"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_post(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(post_id): Path<PostId>,
) -> Result<Json<MessageResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut posts = Posts::new(&mut tx);
    posts
        .get_for_user(post_id, current_user.id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Post".to_string(),
        })?;

    posts.delete(post_id).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(MessageResponse::new("Post eliminado exitosamente")))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, register_and_login};
    use axum::http::StatusCode;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_post_crud_roundtrip(pool: PgPool) {
        let server = create_test_app(pool);
        let pair = register_and_login(&server, "a@x.com", "au", "Test1234!").await;

        let response = server
            .post("/posts")
            .authorization_bearer(&pair.access_token)
            .json(&serde_json::json!({ "title": "Mi primer tomate", "content": "Por fin maduró." }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let post: serde_json::Value = response.json();
        let post_id = post["id"].as_str().unwrap().to_string();

        let response = server
            .get(&format!("/posts/{post_id}"))
            .authorization_bearer(&pair.access_token)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["title"], "Mi primer tomate");

        let response = server
            .put(&format!("/posts/{post_id}"))
            .authorization_bearer(&pair.access_token)
            .json(&serde_json::json!({ "title": "Mi primer tomate (editado)" }))
            .await;
        response.assert_status_ok();

        let response = server
            .delete(&format!("/posts/{post_id}"))
            .authorization_bearer(&pair.access_token)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Post eliminado exitosamente");
    }

    #[sqlx::test]
    async fn test_list_posts_paginates(pool: PgPool) {
        let server = create_test_app(pool);
        let pair = register_and_login(&server, "a@x.com", "au", "Test1234!").await;

        for i in 0..3 {
            let response = server
                .post("/posts")
                .authorization_bearer(&pair.access_token)
                .json(&serde_json::json!({ "title": format!("Post {i}"), "content": "..." }))
                .await;
            response.assert_status(StatusCode::CREATED);
        }

        let response = server
            .get("/posts")
            .authorization_bearer(&pair.access_token)
            .add_query_param("skip", "1")
            .add_query_param("limit", "1")
            .await;
        response.assert_status_ok();
        let posts: serde_json::Value = response.json();
        assert_eq!(posts.as_array().unwrap().len(), 1);
    }

    #[sqlx::test]
    async fn test_foreign_post_update_is_not_found(pool: PgPool) {
        let server = create_test_app(pool);
        let owner = register_and_login(&server, "a@x.com", "au", "Test1234!").await;
        let intruder = register_and_login(&server, "b@x.com", "bu", "Test1234!").await;

        let response = server
            .post("/posts")
            .authorization_bearer(&owner.access_token)
            .json(&serde_json::json!({ "title": "Privado", "content": "..." }))
            .await;
        let post: serde_json::Value = response.json();
        let post_id = post["id"].as_str().unwrap().to_string();

        // Someone else's post is indistinguishable from a missing one
        let response = server
            .put(&format!("/posts/{post_id}"))
            .authorization_bearer(&intruder.access_token)
            .json(&serde_json::json!({ "title": "Tomado" }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let response = server
            .delete(&format!("/posts/{post_id}"))
            .authorization_bearer(&intruder.access_token)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
