//! Service resolution for handler and hook parameters.
//!
//! Two sources are consulted, in order:
//!
//! 1. An optional external [`ServiceSource`] configured on the root command
//!    (for example a [`Services`] map of long-lived resources).
//! 2. The invocation-scoped [`ServiceChain`], which holds the invocation
//!    context, the configuration, and every model instance built so far,
//!    registered root first. Lookups walk it from the most recent entry back.
//!
//! The [`Resolver`] applies that order and the strict policy. Parameter types
//! implement [`Inject`]:
//!
//! | Parameter | Resolved | Not resolved, lenient | Not resolved, strict |
//! |-----------|----------|-----------------------|----------------------|
//! | `Rc<T>` | the instance | error | error |
//! | `Option<Rc<T>>` | `Some(instance)` | `None` | error |
//!
//! Tuples of up to six parameters resolve left to right and stop at the
//! first failure.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::InvokeError;

/// A source of services looked up by type.
pub trait ServiceSource {
    /// Returns the instance registered for `type_id`, if any.
    fn get_service(&self, type_id: TypeId) -> Option<Rc<dyn Any>>;
}

impl<F> ServiceSource for F
where
    F: Fn(TypeId) -> Option<Rc<dyn Any>>,
{
    fn get_service(&self, type_id: TypeId) -> Option<Rc<dyn Any>> {
        self(type_id)
    }
}

/// Type-keyed container of long-lived services.
///
/// Each type holds at most one instance. Values are shared, so handlers
/// receive `Rc<T>` clones of what was inserted.
///
/// # Example
///
/// ```rust
/// use modelbind::Services;
/// use std::collections::BTreeMap;
///
/// let mut services = Services::new();
/// services.insert(BTreeMap::from([("var1".to_string(), "Variable #1".to_string())]));
///
/// let vars = services.get::<BTreeMap<String, String>>().unwrap();
/// assert_eq!(vars["var1"], "Variable #1");
/// ```
#[derive(Default, Clone)]
pub struct Services {
    map: HashMap<TypeId, Rc<dyn Any>>,
}

impl Services {
    /// Creates a new empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous value of the same type.
    pub fn insert<T: 'static>(&mut self, val: T) -> &mut Self {
        self.insert_rc(Rc::new(val))
    }

    /// Inserts an already shared value.
    pub fn insert_rc<T: 'static>(&mut self, val: Rc<T>) -> &mut Self {
        self.map.insert(TypeId::of::<T>(), val);
        self
    }

    /// Gets the value of the specified type.
    pub fn get<T: 'static>(&self) -> Option<Rc<T>> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|rc| rc.clone().downcast::<T>().ok())
    }

    /// Gets the value of the specified type, or an error naming the type.
    pub fn get_required<T: 'static>(&self) -> Result<Rc<T>, anyhow::Error> {
        self.get::<T>().ok_or_else(|| {
            anyhow::anyhow!("Service missing: type {} not registered", type_name::<T>())
        })
    }

    /// Removes the value of the specified type, returning it if it existed.
    pub fn remove<T: 'static>(&mut self) -> Option<Rc<T>> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|rc| rc.downcast::<T>().ok())
    }

    /// Returns `true` if a value of the specified type is registered.
    pub fn contains<T: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl ServiceSource for Services {
    fn get_service(&self, type_id: TypeId) -> Option<Rc<dyn Any>> {
        self.map.get(&type_id).cloned()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("len", &self.map.len())
            .finish_non_exhaustive()
    }
}

struct ServiceEntry {
    type_id: TypeId,
    type_name: &'static str,
    instance: Rc<dyn Any>,
}

/// The invocation-scoped chain of registered instances.
///
/// Entries are kept in registration order. Lookups walk backwards, so the
/// most specific (most recently registered) instance of a type wins.
#[derive(Default)]
pub struct ServiceChain {
    entries: Vec<ServiceEntry>,
}

impl ServiceChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an instance under its own type.
    pub fn register<T: 'static>(&mut self, instance: Rc<T>) {
        self.register_erased(TypeId::of::<T>(), type_name::<T>(), instance);
    }

    pub(crate) fn register_erased(
        &mut self,
        type_id: TypeId,
        type_name: &'static str,
        instance: Rc<dyn Any>,
    ) {
        tracing::debug!(service = type_name, "adding service");
        self.entries.push(ServiceEntry {
            type_id,
            type_name,
            instance,
        });
    }

    /// Looks up the most recently registered instance of a type.
    pub fn get<T: 'static>(&self) -> Option<Rc<T>> {
        self.get_service(TypeId::of::<T>())
            .and_then(|rc| rc.downcast::<T>().ok())
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.get_service(TypeId::of::<T>()).is_some()
    }

    /// Type names of the registered instances, oldest first.
    pub fn type_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.type_name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ServiceSource for ServiceChain {
    fn get_service(&self, type_id: TypeId) -> Option<Rc<dyn Any>> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.type_id == type_id)
            .map(|e| e.instance.clone())
    }
}

impl fmt::Debug for ServiceChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.type_names()).finish()
    }
}

/// Applies the lookup order and strict policy for one invocation.
pub struct Resolver<'a> {
    external: Option<&'a dyn ServiceSource>,
    chain: &'a ServiceChain,
    strict: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(
        external: Option<&'a dyn ServiceSource>,
        chain: &'a ServiceChain,
        strict: bool,
    ) -> Self {
        Self {
            external,
            chain,
            strict,
        }
    }

    /// Returns true if unresolved parameters are fatal.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Looks up `T`: external source first, then the chain.
    ///
    /// Returns `Ok(None)` when absent and the policy is lenient.
    pub fn resolve<T: 'static>(&self) -> Result<Option<Rc<T>>, InvokeError> {
        let type_id = TypeId::of::<T>();
        let external = self
            .external
            .and_then(|source| source.get_service(type_id))
            .and_then(|rc| match rc.downcast::<T>() {
                Ok(found) => Some(found),
                Err(_) => {
                    tracing::warn!(
                        service = type_name::<T>(),
                        "external service has the wrong type, ignoring it"
                    );
                    None
                }
            });
        let found = external.or_else(|| self.chain.get::<T>());
        tracing::trace!(service = type_name::<T>(), found = found.is_some(), "resolve");

        match found {
            Some(found) => Ok(Some(found)),
            None if self.strict => Err(unresolved::<T>()),
            None => Ok(None),
        }
    }

    /// Looks up `T`, failing when absent regardless of policy.
    pub fn require<T: 'static>(&self) -> Result<Rc<T>, InvokeError> {
        self.resolve::<T>()?.ok_or_else(unresolved::<T>)
    }
}

fn unresolved<T: 'static>() -> InvokeError {
    InvokeError::UnresolvedDependency {
        type_name: type_name::<T>(),
    }
}

/// A handler or hook parameter that can be resolved from services.
pub trait Inject: Sized {
    fn inject(resolver: &Resolver<'_>) -> Result<Self, InvokeError>;
}

impl<T: 'static> Inject for Rc<T> {
    fn inject(resolver: &Resolver<'_>) -> Result<Self, InvokeError> {
        resolver.require::<T>()
    }
}

impl<T: 'static> Inject for Option<Rc<T>> {
    fn inject(resolver: &Resolver<'_>) -> Result<Self, InvokeError> {
        resolver.resolve::<T>()
    }
}

impl Inject for () {
    fn inject(_resolver: &Resolver<'_>) -> Result<Self, InvokeError> {
        Ok(())
    }
}

macro_rules! impl_inject_tuple {
    ($($name:ident),+) => {
        impl<$($name: Inject),+> Inject for ($($name,)+) {
            fn inject(resolver: &Resolver<'_>) -> Result<Self, InvokeError> {
                Ok(($($name::inject(resolver)?,)+))
            }
        }
    };
}

impl_inject_tuple!(A);
impl_inject_tuple!(A, B);
impl_inject_tuple!(A, B, C);
impl_inject_tuple!(A, B, C, D);
impl_inject_tuple!(A, B, C, D, E);
impl_inject_tuple!(A, B, C, D, E, F);
