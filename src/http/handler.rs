//! User handler contract.

use futures_util::future::BoxFuture;

use crate::http::error::HandlerError;
use crate::http::request::Request;
use crate::http::response::Response;

/// Application code invoked once per request.
///
/// The handler may read the request, write the response, and fail with a
/// [`HandlerError`]. Returning `Err(HandlerError::Api(_))` answers the
/// request with that status; any other error aborts the connection.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<(), HandlerError>>;
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, Result<(), HandlerError>>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<(), HandlerError>> {
        (self)(req, res)
    }
}

/// Pin the closure signature so that it is inferred as higher-ranked.
///
/// ```ignore
/// let handler = handler_fn(|req, res| Box::pin(async move {
///     res.json(req.query())?;
///     Ok(())
/// }));
/// ```
pub fn handler_fn<F>(f: F) -> F
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, Result<(), HandlerError>>
        + Send
        + Sync
        + 'static,
{
    f
}
