use rocket::request::{self, Request, FromRequest, Outcome};
use rocket::http::Status;
use crate::guards::AuthGuard;
use rocket_okapi::request::OpenApiFromRequest;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::request::RequestHeaderInput;

/// Restricts a route to tokens carrying the admin claim.
pub struct AdminGuard {
    pub auth: AuthGuard,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminGuard {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let auth_outcome = req.guard::<AuthGuard>().await;

        match auth_outcome {
            Outcome::Success(auth) => {
                if auth.is_admin {
                    Outcome::Success(AdminGuard { auth })
                } else {
                    warn!("Admin guard rejected non-admin user {}", auth.user_id.to_hex());
                    Outcome::Error((Status::Forbidden, ()))
                }
            }
            Outcome::Error(e) => Outcome::Error(e),
            Outcome::Forward(f) => Outcome::Forward(f),
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for AdminGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }
}
