use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::users::UserRepository;

/// GET /users/{user_id}
///
/// Behind the auth gate. Returns the user without the password hash.
///
/// # Errors
/// - 400: id is not an integer
/// - 404: no such user
pub async fn get_user(
    path: web::Path<String>,
    users: web::Data<dyn UserRepository>,
) -> Result<HttpResponse, AppError> {
    let raw_id = path.into_inner();
    let user_id: i32 = raw_id
        .parse()
        .map_err(|_| AppError::MalformedInput(format!("invalid user id {:?}", raw_id)))?;

    let user = users.get_user(user_id).await?;

    Ok(HttpResponse::Ok().json(user))
}
