use crate::handler::{Handler, HttpResponse, IntoResponse};
use crate::http::request::normalize_path;
use crate::http::{Method, Request};
use crate::middleware::{Middleware, MiddlewareManager, Next};
use std::collections::HashMap;
use std::future::Future;

#[derive(Clone)]
pub(crate) struct Route {
    middlewares: MiddlewareManager,
    handler: Box<dyn Handler>,
}

impl Route {
    pub async fn handle(&self, req: Request) -> HttpResponse {
        self.middlewares
            .call(req, Next::new_handler(self.handler.clone()))
            .await
    }
}

/// Outcome of matching a request against the route table.
pub(crate) enum RouteMatch<'a> {
    Found(&'a Route),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// Exact-path route table keyed by path, then by method.
#[derive(Clone)]
pub struct Router {
    middlewares: MiddlewareManager,
    routes: HashMap<String, HashMap<Method, Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            middlewares: MiddlewareManager::new(),
            routes: HashMap::new(),
        }
    }

    pub fn get<F, Fut, R>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.route(Method::GET, path, handler)
    }

    pub fn post<F, Fut, R>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.route(Method::POST, path, handler)
    }

    pub fn put<F, Fut, R>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.route(Method::PUT, path, handler)
    }

    pub fn delete<F, Fut, R>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.route(Method::DELETE, path, handler)
    }

    pub fn route<F, Fut, R>(&mut self, method: Method, path: &str, handler: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        let path = normalize_path(path);
        self.routes.entry(path).or_default().insert(
            method,
            Route {
                middlewares: self.middlewares.clone(),
                handler: Box::new(handler),
            },
        );
        self
    }

    pub fn middleware(&mut self, middleware: impl Middleware + 'static) {
        self.middlewares.add(middleware);
    }

    pub(crate) fn lookup(&self, method: Method, path: &str) -> RouteMatch<'_> {
        match self.routes.get(path) {
            Some(methods) => match methods.get(&method) {
                Some(route) => RouteMatch::Found(route),
                None => RouteMatch::MethodNotAllowed(self.allowed(path)),
            },
            None => RouteMatch::NotFound,
        }
    }

    /// The registered route for (method, path), ignoring whether the request
    /// used that method. Used for HEAD and OPTIONS fallbacks.
    pub(crate) fn route_for(&self, method: Method, path: &str) -> Option<&Route> {
        self.routes.get(path).and_then(|methods| methods.get(&method))
    }

    /// Registered methods for a path, sorted for a stable `Allow` header.
    pub(crate) fn allowed(&self, path: &str) -> Vec<Method> {
        let mut allowed: Vec<Method> = self
            .routes
            .get(path)
            .map(|methods| methods.keys().copied().collect())
            .unwrap_or_default();
        allowed.sort_by_key(|m| m.as_str());
        allowed
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
