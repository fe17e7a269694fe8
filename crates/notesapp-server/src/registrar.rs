//! Feature module composition.
//!
//! A feature module is a named route table. Whatever services and validators
//! its handlers need are handed to the module's constructor, so modules never
//! reach into a shared lookup and never see each other's internals.
//!
//! [`Registrar`] merges route tables into one router in the order modules are
//! registered. A route claimed twice, or two paths that differ only in their
//! parameter names, is a configuration defect and aborts startup.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::{
    Router,
    http::Method,
    routing::{MethodFilter, MethodRouter, on_service},
};

use crate::auth::{CredentialVerifier, authenticate};
use crate::health;

/// Owner recorded for routes the registrar installs itself.
pub const BUILTIN_MODULE: &str = "builtin";

/// Whether a route needs a verified caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
}

/// One entry of a module's route table.
pub struct Route {
    method: Method,
    path: &'static str,
    access: Access,
    handler: MethodRouter,
}

impl Route {
    /// Build a route, e.g. `Route::new(Method::GET, "/notes", access, get(list_notes))`.
    ///
    /// Once registered, `handler` only sees requests for `method`; anything
    /// else it would serve is answered with 405.
    pub fn new(method: Method, path: &'static str, access: Access, handler: MethodRouter) -> Self {
        Self {
            method,
            path,
            access,
            handler,
        }
    }

    pub fn public(method: Method, path: &'static str, handler: MethodRouter) -> Self {
        Self::new(method, path, Access::Public, handler)
    }

    pub fn authenticated(method: Method, path: &'static str, handler: MethodRouter) -> Self {
        Self::new(method, path, Access::Authenticated, handler)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn access(&self) -> Access {
        self.access
    }

    /// The handler, without any access control or method restriction applied.
    pub fn into_handler(self) -> MethodRouter {
        self.handler
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

/// An independently developed feature unit.
pub trait FeatureModule {
    /// Unique module name.
    fn name(&self) -> &'static str;

    /// The module's route table, with handlers already bound to the module's
    /// own dependencies.
    fn routes(&self) -> Vec<Route>;
}

/// A route as recorded by the registrar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredRoute {
    pub module: &'static str,
    pub method: Method,
    pub path: &'static str,
    pub access: Access,
}

/// Registration failures. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("module {module} declares {method} {path}, already registered by module {owner}")]
    RouteCollision {
        module: &'static str,
        owner: &'static str,
        method: Method,
        path: &'static str,
    },

    #[error("module {module} declares {method} {path} twice")]
    DuplicateRoute {
        module: &'static str,
        method: Method,
        path: &'static str,
    },

    #[error("module {module} declares {path}, which conflicts with {existing} from module {owner}")]
    PathConflict {
        module: &'static str,
        owner: &'static str,
        path: &'static str,
        existing: &'static str,
    },

    #[error("module {module} declares {path} for unsupported method {method}")]
    UnsupportedMethod {
        module: &'static str,
        method: Method,
        path: &'static str,
    },

    #[error("module {module} declares invalid route {path}: {reason}")]
    InvalidRoute {
        module: &'static str,
        path: &'static str,
        reason: String,
    },
}

/// How a new route clashes with one already claimed.
enum Clash {
    /// Same method and path.
    Route,
    /// Same path structure under different parameter names.
    Path,
}

/// Composes feature modules into a single router.
///
/// `GET /health` is installed up front and cannot be claimed by a module.
pub struct Registrar {
    verifier: Arc<CredentialVerifier>,
    router: Router,
    builtin: Vec<RegisteredRoute>,
    table: Vec<RegisteredRoute>,
    modules: Vec<&'static str>,
}

impl Registrar {
    pub fn new(verifier: Arc<CredentialVerifier>) -> Self {
        Self {
            verifier,
            router: health::routes(),
            builtin: vec![RegisteredRoute {
                module: BUILTIN_MODULE,
                method: Method::GET,
                path: health::PATH,
                access: Access::Public,
            }],
            table: Vec::new(),
            modules: Vec::new(),
        }
    }

    /// Register a module's route table.
    ///
    /// Registering a module name a second time is a no-op. The table is
    /// checked in full and merged into a copy of the router, so a failed
    /// registration leaves the registrar unchanged.
    pub fn register<M: FeatureModule + ?Sized>(&mut self, module: &M) -> Result<(), RegistrationError> {
        let name = module.name();
        if self.modules.contains(&name) {
            tracing::warn!(module = name, "module already registered, skipping");
            return Ok(());
        }

        let routes = module.routes();
        let mut claimed: Vec<RegisteredRoute> = Vec::with_capacity(routes.len());
        let mut filters = Vec::with_capacity(routes.len());
        for route in &routes {
            let filter = MethodFilter::try_from(route.method.clone()).map_err(|_| {
                RegistrationError::UnsupportedMethod {
                    module: name,
                    method: route.method.clone(),
                    path: route.path,
                }
            })?;
            let candidate = RegisteredRoute {
                module: name,
                method: route.method.clone(),
                path: route.path,
                access: route.access,
            };
            self.check(&candidate, &claimed)?;
            claimed.push(candidate);
            filters.push(filter);
        }

        let mut router = self.router.clone();
        for (route, filter) in routes.into_iter().zip(filters) {
            let path = route.path;
            let handler = on_service(filter, route.handler);
            let handler = match route.access {
                Access::Public => handler,
                Access::Authenticated => handler.route_layer(
                    axum::middleware::from_fn_with_state(self.verifier.clone(), authenticate),
                ),
            };
            // The router reports a rejected path by panicking.
            router = panic::catch_unwind(AssertUnwindSafe(|| router.route(path, handler)))
                .map_err(|payload| RegistrationError::InvalidRoute {
                    module: name,
                    path,
                    reason: panic_message(payload.as_ref()),
                })?;
        }

        let count = claimed.len();
        self.router = router;
        self.table.extend(claimed);
        self.modules.push(name);

        tracing::info!(module = name, routes = count, "module registered");
        Ok(())
    }

    /// Registered routes, grouped by module in registration order.
    pub fn route_table(&self) -> &[RegisteredRoute] {
        &self.table
    }

    /// Names of registered modules, in registration order.
    pub fn modules(&self) -> &[&'static str] {
        &self.modules
    }

    pub fn into_router(self) -> Router {
        self.router
    }

    fn check(
        &self,
        candidate: &RegisteredRoute,
        own: &[RegisteredRoute],
    ) -> Result<(), RegistrationError> {
        for existing in self.builtin.iter().chain(&self.table) {
            match clash(existing, candidate) {
                Some(Clash::Route) => {
                    return Err(RegistrationError::RouteCollision {
                        module: candidate.module,
                        owner: existing.module,
                        method: candidate.method.clone(),
                        path: candidate.path,
                    });
                }
                Some(Clash::Path) => {
                    return Err(RegistrationError::PathConflict {
                        module: candidate.module,
                        owner: existing.module,
                        path: candidate.path,
                        existing: existing.path,
                    });
                }
                None => {}
            }
        }

        for existing in own {
            match clash(existing, candidate) {
                Some(Clash::Route) => {
                    return Err(RegistrationError::DuplicateRoute {
                        module: candidate.module,
                        method: candidate.method.clone(),
                        path: candidate.path,
                    });
                }
                Some(Clash::Path) => {
                    return Err(RegistrationError::PathConflict {
                        module: candidate.module,
                        owner: candidate.module,
                        path: candidate.path,
                        existing: existing.path,
                    });
                }
                None => {}
            }
        }
        Ok(())
    }
}

fn clash(existing: &RegisteredRoute, candidate: &RegisteredRoute) -> Option<Clash> {
    if path_shape(existing.path) != path_shape(candidate.path) {
        None
    } else if existing.path != candidate.path {
        Some(Clash::Path)
    } else if existing.method == candidate.method {
        Some(Clash::Route)
    } else {
        None
    }
}

/// `path` with parameter names erased: `/notes/{id}` becomes `/notes/{}` and
/// `/files/{*rest}` becomes `/files/{*}`. Escaped braces are kept as written.
fn path_shape(path: &str) -> String {
    let mut shape = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                shape.push_str("{{");
            }
            '{' => {
                let mut name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    name.push(c);
                }
                shape.push_str(if name.starts_with('*') { "{*}" } else { "{}" });
            }
            c => shape.push(c),
        }
    }
    shape
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "route rejected by the router".to_string())
}
