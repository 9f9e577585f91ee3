//! OpenAPI document assembly.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the bearer-token security scheme referenced by the handlers.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vergel API",
        description = "API REST para la gestión de jardines, plantas y usuarios"
    ),
    paths(
        crate::api::handlers::auth::register,
        crate::api::handlers::auth::login,
        crate::api::handlers::auth::refresh,
        crate::api::handlers::auth::request_password_reset,
        crate::api::handlers::auth::password_reset_form,
        crate::api::handlers::auth::confirm_password_reset,
        crate::api::handlers::auth::get_me,
        crate::api::handlers::auth::update_me,
        crate::api::handlers::auth::delete_me,
        crate::api::handlers::gardens::create_garden,
        crate::api::handlers::gardens::list_gardens,
        crate::api::handlers::gardens::update_garden,
        crate::api::handlers::gardens::delete_garden,
        crate::api::handlers::plants::add_plant,
        crate::api::handlers::plants::list_garden_plants,
        crate::api::handlers::plants::update_plant,
        crate::api::handlers::plants::delete_plant,
        crate::api::handlers::notes::create_note,
        crate::api::handlers::notes::list_notes,
        crate::api::handlers::notes::update_note,
        crate::api::handlers::notes::delete_note,
        crate::api::handlers::posts::create_post,
        crate::api::handlers::posts::list_posts,
        crate::api::handlers::posts::get_post,
        crate::api::handlers::posts::update_post,
        crate::api::handlers::posts::delete_post,
        crate::api::handlers::identify::identify_plant,
    ),
    components(schemas(
        crate::api::models::MessageResponse,
        crate::api::models::auth::RegisterRequest,
        crate::api::models::auth::LoginRequest,
        crate::api::models::auth::TokenPairResponse,
        crate::api::models::auth::RefreshRequest,
        crate::api::models::auth::PasswordResetRequest,
        crate::api::models::auth::PasswordResetConfirmRequest,
        crate::api::models::users::UserResponse,
        crate::api::models::users::UserUpdateRequest,
        crate::api::models::gardens::GardenResponse,
        crate::api::models::gardens::GardenListResponse,
        crate::api::models::gardens::GardenUpdateResponse,
        crate::api::models::plants::PlantCreateRequest,
        crate::api::models::plants::PlantResponse,
        crate::api::models::plants::PlantListResponse,
        crate::api::models::plants::PlantUpdateResponse,
        crate::api::models::notes::NoteCreateRequest,
        crate::api::models::notes::NoteUpdateRequest,
        crate::api::models::notes::NoteResponse,
        crate::api::models::posts::PostCreateRequest,
        crate::api::models::posts::PostUpdateRequest,
        crate::api::models::posts::PostResponse,
    )),
    tags(
        (name = "auth", description = "Registro, sesión y ciclo de vida de credenciales"),
        (name = "gardens", description = "Gestión de jardines"),
        (name = "plants", description = "Gestión e identificación de plantas"),
        (name = "notes", description = "Notas de observación"),
        (name = "posts", description = "Publicaciones"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_builds_and_lists_auth_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();

        assert!(paths.contains(&"/auth/register".to_string()));
        assert!(paths.contains(&"/auth/password-reset".to_string()));
        assert!(paths.contains(&"/gardens/{garden_id}/plants".to_string()));
        assert!(paths.contains(&"/identify".to_string()));
    }
}
