mod routes;

pub use routes::router;

pub mod middleware {
    use axum::{
        extract::Request,
        http::Uri,
        middleware::Next,
        response::{IntoResponse, Redirect, Response},
    };

    use crate::{ctx::Ctx, shared::flash::Flash};

    /// Lets signed-in users through; everyone else goes to the sign-in page and comes back afterwards.
    pub async fn protected_view(ctx: Ctx, flash: Flash, url: Uri, request: Request, next: Next) -> Response {
        if ctx.user.is_some() {
            return next.run(request).await;
        }

        flash.error("Not Authorized").await;

        let path = url.path();
        let redirect_url = format!("/users/signin?next={path}");

        Redirect::to(&redirect_url).into_response()
    }
}
