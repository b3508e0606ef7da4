use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{Error, ErrorKind, Result};
use crate::interface::Interface;
use crate::{ObjectPath, OwnedObjectPath};

struct BindingInner {
    path: OwnedObjectPath,
    interfaces: Mutex<HashMap<Box<str>, Arc<Interface>>>,
}

/// A shared handle to the set of interfaces bound at a single object path.
///
/// [`Binding`] is reference-counted ([`Clone`] is a cheap pointer copy) so
/// the same registration can be handed to a [`crate::Proxy`] running on
/// another thread through [`crate::ProxyCallbacks`] without re-synchronizing
/// with the owning [`crate::Connection`].
#[derive(Clone)]
pub struct Binding {
    inner: Arc<BindingInner>,
}

impl Binding {
    pub(crate) fn new(path: OwnedObjectPath) -> Self {
        Self {
            inner: Arc::new(BindingInner {
                path,
                interfaces: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The object path this binding is registered at.
    pub fn path(&self) -> &ObjectPath {
        &self.inner.path
    }

    /// Register `interface` with this binding.
    ///
    /// Returns [`ErrorKind::DuplicateBinding`] if an interface with the same
    /// name is already registered at this path.
    pub fn add_interface(&self, interface: Interface) -> Result<()> {
        let mut interfaces = self.inner.interfaces.lock().unwrap();

        if interfaces.contains_key(interface.name()) {
            return Err(Error::new(ErrorKind::DuplicateBinding));
        }

        interfaces.insert(Box::from(interface.name()), Arc::new(interface));
        Ok(())
    }

    /// Remove a previously registered interface.
    pub fn remove_interface(&self, name: &str) -> bool {
        self.inner.interfaces.lock().unwrap().remove(name).is_some()
    }

    /// Look up an interface registered under `name`.
    pub(crate) fn interface(&self, name: &str) -> Option<Arc<Interface>> {
        self.inner.interfaces.lock().unwrap().get(name).cloned()
    }

    /// The names of every interface currently registered at this path.
    pub fn interfaces(&self) -> Vec<Box<str>> {
        self.inner.interfaces.lock().unwrap().keys().cloned().collect()
    }

    /// Resolve `member` to a method without an explicit interface name.
    ///
    /// Returns [`ErrorKind::AmbiguousMethod`] if more than one registered
    /// interface defines a method with that name, and
    /// [`ErrorKind::UnknownMethod`] if none do.
    pub(crate) fn resolve_method(&self, member: &str) -> Result<(Arc<Interface>, ())> {
        let interfaces = self.inner.interfaces.lock().unwrap();
        let mut found: Option<Arc<Interface>> = None;

        for interface in interfaces.values() {
            if interface.method(member).is_some() {
                if found.is_some() {
                    return Err(Error::new(ErrorKind::AmbiguousMethod));
                }

                found = Some(interface.clone());
            }
        }

        match found {
            Some(interface) => Ok((interface, ())),
            None => Err(Error::new(ErrorKind::UnknownMethod)),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inner.interfaces.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Endianness, Interface};

    fn path() -> OwnedObjectPath {
        ObjectPath::new(b"/org/example/Thing").unwrap().to_owned()
    }

    #[test]
    fn add_interface_then_resolve_method() {
        let binding = Binding::new(path());
        let interface = Interface::new("org.example.Thing")
            .unwrap()
            .with_method(crate::interface::Method::new(
                "Ping",
                crate::Signature::EMPTY,
                |_| Ok(crate::buf::Buffer::new(Endianness::NATIVE)),
            ));
        binding.add_interface(interface).unwrap();

        let (interface, _) = binding.resolve_method("Ping").unwrap();
        assert_eq!(interface.name(), "org.example.Thing");
    }

    #[test]
    fn duplicate_interface_is_rejected() {
        let binding = Binding::new(path());
        binding
            .add_interface(Interface::new("org.example.Thing").unwrap())
            .unwrap();
        let err = binding
            .add_interface(Interface::new("org.example.Thing").unwrap())
            .unwrap_err();
        assert!(matches!(format!("{err}").as_str(), s if s.contains("binding")));
    }

    #[test]
    fn ambiguous_method_across_interfaces_is_rejected() {
        let binding = Binding::new(path());
        binding
            .add_interface(
                Interface::new("org.example.A")
                    .unwrap()
                    .with_method(crate::interface::Method::new(
                        "Ping",
                        crate::Signature::EMPTY,
                        |_| Ok(crate::buf::Buffer::new(Endianness::NATIVE)),
                    )),
            )
            .unwrap();
        binding
            .add_interface(
                Interface::new("org.example.B")
                    .unwrap()
                    .with_method(crate::interface::Method::new(
                        "Ping",
                        crate::Signature::EMPTY,
                        |_| Ok(crate::buf::Buffer::new(Endianness::NATIVE)),
                    )),
            )
            .unwrap();

        assert!(binding.resolve_method("Ping").is_err());
    }
}
