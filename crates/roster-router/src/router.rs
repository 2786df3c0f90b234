//! Dispatch table from action name to handler.

use std::{collections::HashMap, sync::Arc};

use roster_core::{
    AuthPolicy, BrokerConfig, CredentialChecker, Request, Response, SessionContext,
};
use roster_store::CollectionService;
use thiserror::Error;

use crate::{
    action::Action,
    credentials::StaticCredentials,
    handlers::{
        ActionHandler, AddHandler, DeleteHandler, GetDataHandler, LoginHandler, UpdateHandler,
    },
};

/// Router construction error.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("No handler registered for action {0}")]
    MissingHandler(Action),
}

/// Builder for `ActionRouter`.
#[derive(Default)]
pub struct RouterBuilder {
    handlers: HashMap<Action, Arc<dyn ActionHandler>>,
    auth_policy: AuthPolicy,
}

impl RouterBuilder {
    /// Register (or replace) the handler for an action.
    #[must_use]
    pub fn handler(mut self, action: Action, handler: impl ActionHandler + 'static) -> Self {
        self.handlers.insert(action, Arc::new(handler));
        self
    }

    #[must_use]
    pub const fn auth_policy(mut self, policy: AuthPolicy) -> Self {
        self.auth_policy = policy;
        self
    }

    /// Register the built-in handlers for every catalog action.
    #[must_use]
    pub fn standard_handlers(
        mut self,
        service: &Arc<CollectionService>,
        checker: Arc<dyn CredentialChecker>,
    ) -> Self {
        for action in Action::ALL {
            let handler: Arc<dyn ActionHandler> = match action {
                Action::Login => Arc::new(LoginHandler::new(Arc::clone(&checker))),
                Action::Get(c) => Arc::new(GetDataHandler::new(Arc::clone(service), c)),
                Action::Add(c) => Arc::new(AddHandler::new(Arc::clone(service), c)),
                Action::Delete(c) => Arc::new(DeleteHandler::new(Arc::clone(service), c)),
                Action::Update(c) => Arc::new(UpdateHandler::new(Arc::clone(service), c)),
            };
            self.handlers.insert(action, handler);
        }
        self
    }

    /// Build the router.
    ///
    /// # Errors
    /// Returns error if any catalog action has no handler.
    pub fn build(self) -> Result<ActionRouter, RouterError> {
        if let Some(missing) = Action::ALL
            .into_iter()
            .find(|action| !self.handlers.contains_key(action))
        {
            return Err(RouterError::MissingHandler(missing));
        }

        Ok(ActionRouter {
            handlers: self.handlers,
            auth_policy: self.auth_policy,
        })
    }
}

/// Routes each request to the handler for its action.
pub struct ActionRouter {
    handlers: HashMap<Action, Arc<dyn ActionHandler>>,
    auth_policy: AuthPolicy,
}

impl ActionRouter {
    #[must_use]
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Router with the built-in handler for every action.
    ///
    /// # Errors
    /// Returns error if the table is incomplete.
    pub fn standard(
        service: &Arc<CollectionService>,
        checker: Arc<dyn CredentialChecker>,
        auth_policy: AuthPolicy,
    ) -> Result<Self, RouterError> {
        Self::builder()
            .standard_handlers(service, checker)
            .auth_policy(auth_policy)
            .build()
    }

    /// Router using the configured login pair and authorization policy.
    ///
    /// # Errors
    /// Returns error if the table is incomplete.
    pub fn from_config(
        service: &Arc<CollectionService>,
        config: &BrokerConfig,
    ) -> Result<Self, RouterError> {
        Self::standard(
            service,
            Arc::new(StaticCredentials::from(&config.credentials)),
            config.auth_policy,
        )
    }

    #[must_use]
    pub const fn auth_policy(&self) -> AuthPolicy {
        self.auth_policy
    }

    /// Dispatch one request.
    ///
    /// Unknown actions and invalid payloads are logged and produce no
    /// response.
    pub async fn dispatch(&self, session: &mut SessionContext, request: Request) -> Option<Response> {
        let Some(action) = Action::from_name(&request.action) else {
            tracing::warn!(session = %session.id, action = %request.action, "Unknown action");
            return None;
        };

        if self.auth_policy == AuthPolicy::RequireLogin
            && action != Action::Login
            && !session.authenticated
        {
            tracing::warn!(session = %session.id, %action, "Rejected action before login");
            return Some(Response::login_required());
        }

        let Some(handler) = self.handlers.get(&action) else {
            tracing::error!(%action, "No handler registered");
            return None;
        };

        tracing::debug!(session = %session.id, %action, "Dispatching");
        match handler.handle(session, request.payload).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(session = %session.id, error = %e, "Handler rejected request");
                None
            }
        }
    }
}
