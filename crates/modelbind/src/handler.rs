//! Handler and hook types.
//!
//! Each model may register one handler, either synchronous or asynchronous,
//! and one post-bind hook. Both are plain closures. Their extra parameters are
//! resolved from services through [`Inject`] before the closure runs.
//!
//! | Registration | Closure shape |
//! |--------------|---------------|
//! | `invoke` | `Fn(Rc<M>, A) -> Result<T, E>` |
//! | `invoke_async` | `Fn(Rc<M>, A) -> impl Future<Output = Result<T, E>>` |
//! | `after_bind` | `Fn(&mut M, A) -> anyhow::Result<()>` |
//!
//! where `A: Inject`, `T: Serialize` and `E: Into<anyhow::Error>`.
//!
//! Handlers receive the bound instance behind an `Rc`, which keeps async
//! handler futures `'static` while the same instance stays registered as a
//! service for the rest of the invocation.

use std::any::{type_name, Any};
use std::future::Future;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};
use serde::Serialize;

use crate::error::InvokeError;
use crate::services::{Inject, Resolver};

/// What a handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Serialized handler data.
    Render(serde_json::Value),
    /// The handler returned unit, or there was no handler.
    Silent,
}

impl Output {
    /// Returns true if this is a render result.
    pub fn is_render(&self) -> bool {
        matches!(self, Output::Render(_))
    }

    /// Returns true if this is a silent result.
    pub fn is_silent(&self) -> bool {
        matches!(self, Output::Silent)
    }

    /// The rendered value, if any.
    pub fn value(&self) -> Option<&serde_json::Value> {
        match self {
            Output::Render(value) => Some(value),
            Output::Silent => None,
        }
    }
}

/// The result type for handlers that pick their [`Output`] explicitly.
pub type HandlerResult = Result<Output, anyhow::Error>;

/// Trait for values a handler can return.
///
/// `Result<T, E>` serializes `T` into [`Output::Render`]; a unit value maps
/// to [`Output::Silent`]. A [`HandlerResult`] passes through unchanged.
///
/// # Example
///
/// ```rust
/// use modelbind::{HandlerResult, IntoHandlerResult, Output};
///
/// let result = Ok::<_, anyhow::Error>(vec!["a", "b"]).into_handler_result();
/// assert!(matches!(result, Ok(Output::Render(_))));
///
/// let result = Ok::<_, anyhow::Error>(()).into_handler_result();
/// assert!(matches!(result, Ok(Output::Silent)));
///
/// let explicit: HandlerResult = Ok(Output::Silent);
/// assert!(explicit.into_handler_result().unwrap().is_silent());
/// ```
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl<T, E> IntoHandlerResult for Result<T, E>
where
    T: Serialize,
    E: Into<anyhow::Error>,
{
    fn into_handler_result(self) -> HandlerResult {
        let data = self.map_err(Into::into)?;
        match serde_json::to_value(data)? {
            serde_json::Value::Null => Ok(Output::Silent),
            value => Ok(Output::Render(value)),
        }
    }
}

impl IntoHandlerResult for HandlerResult {
    fn into_handler_result(self) -> HandlerResult {
        self
    }
}

type SyncFn = dyn Fn(Rc<dyn Any>, &Resolver<'_>) -> Result<Output, InvokeError>;
type AsyncFn = dyn Fn(
    Rc<dyn Any>,
    &Resolver<'_>,
) -> Result<LocalBoxFuture<'static, Result<Output, InvokeError>>, InvokeError>;

/// A type-erased handler for one model.
pub(crate) enum ErasedHandler {
    Sync(Box<SyncFn>),
    Async(Box<AsyncFn>),
}

impl ErasedHandler {
    pub(crate) fn sync<M, A, F, R>(f: F) -> Self
    where
        M: 'static,
        A: Inject,
        F: Fn(Rc<M>, A) -> R + 'static,
        R: IntoHandlerResult,
    {
        ErasedHandler::Sync(Box::new(move |instance, resolver| {
            let model = downcast_instance::<M>(instance)?;
            let args = A::inject(resolver)?;
            f(model, args)
                .into_handler_result()
                .map_err(InvokeError::Handler)
        }))
    }

    pub(crate) fn asynchronous<M, A, F, Fut, R>(f: F) -> Self
    where
        M: 'static,
        A: Inject,
        F: Fn(Rc<M>, A) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
        R: IntoHandlerResult,
    {
        ErasedHandler::Async(Box::new(move |instance, resolver| {
            let model = downcast_instance::<M>(instance)?;
            let args = A::inject(resolver)?;
            let pending = f(model, args);
            Ok(async move {
                pending
                    .await
                    .into_handler_result()
                    .map_err(InvokeError::Handler)
            }
            .boxed_local())
        }))
    }

    pub(crate) fn is_async(&self) -> bool {
        matches!(self, ErasedHandler::Async(_))
    }

    /// Resolves parameters and starts the handler.
    ///
    /// Parameters are resolved before this returns, so the future does not
    /// borrow the resolver. A synchronous handler has already run by then.
    pub(crate) fn call(
        &self,
        instance: Rc<dyn Any>,
        resolver: &Resolver<'_>,
    ) -> LocalBoxFuture<'static, Result<Output, InvokeError>> {
        match self {
            ErasedHandler::Sync(f) => future::ready(f(instance, resolver)).boxed_local(),
            ErasedHandler::Async(f) => match f(instance, resolver) {
                Ok(pending) => pending,
                Err(err) => future::ready(Err(err)).boxed_local(),
            },
        }
    }
}

type HookFn = dyn Fn(&mut dyn Any, &Resolver<'_>) -> Result<(), InvokeError>;

/// A type-erased post-bind hook.
pub(crate) struct ErasedHook(Box<HookFn>);

impl ErasedHook {
    pub(crate) fn new<M, A, F>(f: F) -> Self
    where
        M: 'static,
        A: Inject,
        F: Fn(&mut M, A) -> anyhow::Result<()> + 'static,
    {
        ErasedHook(Box::new(move |instance, resolver| {
            let model = instance.downcast_mut::<M>().ok_or_else(|| {
                InvokeError::binding(
                    type_name::<M>(),
                    "after_bind",
                    anyhow::anyhow!("instance is not a {}", type_name::<M>()),
                )
            })?;
            let args = A::inject(resolver)?;
            f(model, args).map_err(|e| InvokeError::binding(type_name::<M>(), "after_bind", e))
        }))
    }

    pub(crate) fn call(
        &self,
        instance: &mut dyn Any,
        resolver: &Resolver<'_>,
    ) -> Result<(), InvokeError> {
        (self.0)(instance, resolver)
    }
}

fn downcast_instance<M: 'static>(instance: Rc<dyn Any>) -> Result<Rc<M>, InvokeError> {
    instance.downcast::<M>().map_err(|_| {
        InvokeError::binding(
            type_name::<M>(),
            "self",
            anyhow::anyhow!("instance is not a {}", type_name::<M>()),
        )
    })
}
