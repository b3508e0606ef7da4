use std::collections::HashMap;
use std::fmt;

use crate::buf::{Buffer, Iter};
use crate::error::{Error, ErrorKind, Result};
use crate::{Message, OwnedSignature, Signature};

/// A D-Bus error reply a [`Method`] or [`Property`] handler raises instead
/// of returning a value.
#[derive(Debug, Clone)]
pub struct MethodError {
    name: Box<str>,
    message: Box<str>,
}

impl MethodError {
    /// Construct an error named `name` carrying `message` as its sole
    /// string argument, mirroring how D-Bus error replies are conventionally
    /// shaped.
    pub fn new(name: impl Into<Box<str>>, message: impl Into<Box<str>>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

type MethodHandler = Box<dyn Fn(&Message<'_>) -> std::result::Result<Buffer, MethodError> + Send + Sync>;
type PropertyGetter = Box<dyn Fn(&mut Buffer) -> Result<()> + Send + Sync>;
type PropertySetter = Box<dyn Fn(&mut Iter<'_>) -> std::result::Result<(), MethodError> + Send + Sync>;

/// An ordered string-to-string annotation list, as D-Bus introspection
/// attaches to methods, signals, properties, and interfaces themselves
/// (e.g. `org.freedesktop.DBus.Deprecated`).
///
/// Kept as an insertion-ordered `Vec` rather than a `HashMap` because
/// annotations are reproduced verbatim, in order, in generated introspection
/// XML.
pub type Annotations = Vec<(Box<str>, Box<str>)>;

/// A single callable method bound to an [`Interface`].
pub struct Method {
    name: Box<str>,
    signature: OwnedSignature,
    handler: MethodHandler,
    arg_names: Vec<Box<str>>,
    return_names: Vec<Box<str>>,
    annotations: Annotations,
}

impl Method {
    /// Define a method named `name`, accepting arguments matching
    /// `signature`, implemented by `handler`.
    ///
    /// `handler` receives the incoming method call and must return the
    /// reply body, or a [`MethodError`] to be sent back as an error reply.
    pub fn new<F>(name: impl Into<Box<str>>, signature: &Signature, handler: F) -> Self
    where
        F: Fn(&Message<'_>) -> std::result::Result<Buffer, MethodError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature: signature.to_owned(),
            handler: Box::new(handler),
            arg_names: Vec::new(),
            return_names: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Name the next unnamed `in` argument, in signature order.
    ///
    /// Purely descriptive metadata for introspection; argument decoding is
    /// positional and does not consult these names.
    #[must_use]
    pub fn with_arg_name(mut self, name: impl Into<Box<str>>) -> Self {
        self.arg_names.push(name.into());
        self
    }

    /// Name the next unnamed `out` (return) value, in signature order.
    #[must_use]
    pub fn with_return_name(mut self, name: impl Into<Box<str>>) -> Self {
        self.return_names.push(name.into());
        self
    }

    /// Attach an annotation, preserving insertion order.
    #[must_use]
    pub fn with_annotation(mut self, name: impl Into<Box<str>>, value: impl Into<Box<str>>) -> Self {
        self.annotations.push((name.into(), value.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Names given to `in` arguments, in signature order. May be shorter
    /// than the number of arguments the signature describes if some are
    /// left unnamed.
    pub fn arg_names(&self) -> &[Box<str>] {
        &self.arg_names
    }

    /// Names given to `out` (return) values, in signature order.
    pub fn return_names(&self) -> &[Box<str>] {
        &self.return_names
    }

    pub fn annotations(&self) -> &[(Box<str>, Box<str>)] {
        &self.annotations
    }

    pub(crate) fn call(&self, message: &Message<'_>) -> std::result::Result<Buffer, MethodError> {
        (self.handler)(message)
    }
}

/// A single readable, and optionally writable, property exposed on an
/// [`Interface`].
pub struct Property {
    name: Box<str>,
    signature: OwnedSignature,
    getter: Option<PropertyGetter>,
    setter: Option<PropertySetter>,
    annotations: Annotations,
}

impl Property {
    /// Define a read-only property named `name` of type `signature`.
    ///
    /// `getter` appends the property's current value directly into the
    /// buffer it is given, which is already positioned inside the open
    /// variant a `Properties.Get` reply wraps the value in.
    pub fn read_only<F>(name: impl Into<Box<str>>, signature: &Signature, getter: F) -> Self
    where
        F: Fn(&mut Buffer) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature: signature.to_owned(),
            getter: Some(Box::new(getter)),
            setter: None,
            annotations: Vec::new(),
        }
    }

    /// Define a read-write property named `name` of type `signature`.
    pub fn read_write<G, S>(name: impl Into<Box<str>>, signature: &Signature, getter: G, setter: S) -> Self
    where
        G: Fn(&mut Buffer) -> Result<()> + Send + Sync + 'static,
        S: Fn(&mut Iter<'_>) -> std::result::Result<(), MethodError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature: signature.to_owned(),
            getter: Some(Box::new(getter)),
            setter: Some(Box::new(setter)),
            annotations: Vec::new(),
        }
    }

    /// Attach an annotation, preserving insertion order.
    #[must_use]
    pub fn with_annotation(mut self, name: impl Into<Box<str>>, value: impl Into<Box<str>>) -> Self {
        self.annotations.push((name.into(), value.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn annotations(&self) -> &[(Box<str>, Box<str>)] {
        &self.annotations
    }

    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    pub(crate) fn get(&self, buffer: &mut Buffer) -> Option<Result<()>> {
        self.getter.as_ref().map(|getter| getter(buffer))
    }

    pub(crate) fn set(&self, value: &mut Iter<'_>) -> std::result::Result<(), MethodError> {
        match &self.setter {
            Some(setter) => setter(value),
            None => Err(MethodError::new(
                "org.freedesktop.DBus.Error.PropertyReadOnly",
                format!("Property '{}' is read-only", self.name),
            )),
        }
    }
}

/// Metadata describing a signal an [`Interface`] may emit, used for
/// introspection; emitting one is done directly through
/// [`crate::Marshaller::signal`].
#[derive(Debug, Clone)]
pub struct Signal {
    name: Box<str>,
    signature: OwnedSignature,
    arg_names: Vec<Box<str>>,
    annotations: Annotations,
}

impl Signal {
    pub fn new(name: impl Into<Box<str>>, signature: &Signature) -> Self {
        Self {
            name: name.into(),
            signature: signature.to_owned(),
            arg_names: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Name the next unnamed argument, in signature order.
    #[must_use]
    pub fn with_arg_name(mut self, name: impl Into<Box<str>>) -> Self {
        self.arg_names.push(name.into());
        self
    }

    /// Attach an annotation, preserving insertion order.
    #[must_use]
    pub fn with_annotation(mut self, name: impl Into<Box<str>>, value: impl Into<Box<str>>) -> Self {
        self.annotations.push((name.into(), value.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn arg_names(&self) -> &[Box<str>] {
        &self.arg_names
    }

    pub fn annotations(&self) -> &[(Box<str>, Box<str>)] {
        &self.annotations
    }
}

/// A named D-Bus interface, bound to an object path through [`crate::Binding`].
pub struct Interface {
    name: Box<str>,
    methods: HashMap<Box<str>, Method>,
    properties: HashMap<Box<str>, Property>,
    signals: HashMap<Box<str>, Signal>,
    annotations: Annotations,
}

impl Interface {
    /// Construct an interface named `name`.
    ///
    /// `name` must follow the D-Bus dotted interface-name grammar: at least
    /// two elements, each starting with a letter or underscore and
    /// containing only `[A-Za-z0-9_]`.
    pub fn new(name: impl Into<Box<str>>) -> Result<Self> {
        let name = name.into();

        if !is_valid_interface_name(&name) {
            return Err(Error::new(ErrorKind::InvalidInterfaceName));
        }

        Ok(Self {
            name,
            methods: HashMap::new(),
            properties: HashMap::new(),
            signals: HashMap::new(),
            annotations: Vec::new(),
        })
    }

    /// Attach an interface-level annotation, preserving insertion order.
    #[must_use]
    pub fn with_annotation(mut self, name: impl Into<Box<str>>, value: impl Into<Box<str>>) -> Self {
        self.annotations.push((name.into(), value.into()));
        self
    }

    pub fn annotations(&self) -> &[(Box<str>, Box<str>)] {
        &self.annotations
    }

    /// Register a method with this interface.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.insert(method.name.clone(), method);
        self
    }

    /// Register a property with this interface.
    #[must_use]
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.insert(property.name.clone(), property);
        self
    }

    /// Register signal metadata with this interface, for introspection.
    #[must_use]
    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signals.insert(signal.name.clone(), signal);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.values()
    }

    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.signals.values()
    }
}

fn is_valid_interface_name(name: &str) -> bool {
    let elements: Vec<&str> = name.split('.').collect();

    if elements.len() < 2 {
        return false;
    }

    elements.iter().all(|element| {
        let mut chars = element.chars();

        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }

        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_names_without_a_dot() {
        assert!(Interface::new("NoDot").is_err());
    }

    #[test]
    fn rejects_names_with_invalid_characters() {
        assert!(Interface::new("org.freedesktop.DBus!").is_err());
    }

    #[test]
    fn accepts_a_well_formed_name() {
        assert!(Interface::new("org.freedesktop.DBus").is_ok());
    }

    #[test]
    fn methods_round_trip_through_the_interface() {
        let interface = Interface::new("org.example.Thing")
            .unwrap()
            .with_method(Method::new("Ping", Signature::EMPTY, |_message| {
                Ok(crate::buf::Buffer::new(crate::Endianness::NATIVE))
            }));

        assert!(interface.method("Ping").is_some());
        assert!(interface.method("Pong").is_none());
    }

    #[test]
    fn read_only_property_writes_into_the_given_buffer() {
        let interface = Interface::new("org.example.Thing").unwrap().with_property(Property::read_only(
            "Enabled",
            Signature::BOOLEAN,
            |buffer| buffer.append_bool(true),
        ));

        let property = interface.property("Enabled").unwrap();
        assert!(property.is_readable());
        assert!(!property.is_writable());

        let mut buffer = Buffer::new(crate::Endianness::NATIVE);
        property.get(&mut buffer).unwrap().unwrap();
        assert_eq!(buffer.as_bytes(), &[1, 0, 0, 0]);
    }

    #[test]
    fn read_write_property_round_trips_through_setter() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let flag = Arc::new(AtomicBool::new(false));
        let write_flag = flag.clone();

        let interface = Interface::new("org.example.Thing").unwrap().with_property(Property::read_write(
            "Enabled",
            Signature::BOOLEAN,
            move |buffer| buffer.append_bool(flag.load(Ordering::SeqCst)),
            move |value| {
                write_flag.store(value.next_bool().map_err(|_| MethodError::new("org.example.Error", "bad"))?, Ordering::SeqCst);
                Ok(())
            },
        ));

        let property = interface.property("Enabled").unwrap();
        assert!(property.is_writable());

        let mut encoded = Buffer::new(crate::Endianness::NATIVE);
        encoded.append_bool(true).unwrap();
        let mut reader = crate::buf::Iter::new(encoded.as_bytes(), crate::Endianness::NATIVE);
        property.set(&mut reader).unwrap();

        let mut buffer = Buffer::new(crate::Endianness::NATIVE);
        property.get(&mut buffer).unwrap().unwrap();
        assert_eq!(buffer.as_bytes(), &[1, 0, 0, 0]);
    }

    #[test]
    fn setting_a_read_only_property_is_rejected() {
        let interface = Interface::new("org.example.Thing").unwrap().with_property(Property::read_only(
            "Enabled",
            Signature::BOOLEAN,
            |buffer| buffer.append_bool(true),
        ));

        let property = interface.property("Enabled").unwrap();
        let mut buffer = Buffer::new(crate::Endianness::NATIVE);
        buffer.append_bool(false).unwrap();
        let mut reader = crate::buf::Iter::new(buffer.as_bytes(), crate::Endianness::NATIVE);
        assert!(property.set(&mut reader).is_err());
    }

    #[test]
    fn argument_names_and_annotations_are_recorded_in_order() {
        let interface = Interface::new("org.example.Thing")
            .unwrap()
            .with_annotation("org.freedesktop.DBus.Deprecated", "false")
            .with_method(
                Method::new("Echo", Signature::new_const(b"s"), |message| {
                    let input = message
                        .body()
                        .next_string()
                        .map_err(|_| MethodError::new("org.example.Error", "bad argument"))?;
                    let mut body = crate::buf::Buffer::new(crate::Endianness::NATIVE);
                    body.append_string(input)
                        .map_err(|_| MethodError::new("org.example.Error", "encode failure"))?;
                    Ok(body)
                })
                .with_arg_name("input")
                .with_return_name("output")
                .with_annotation("org.freedesktop.DBus.Method.NoReply", "false"),
            )
            .with_signal(
                Signal::new("Status", Signature::new_const(b"u"))
                    .with_arg_name("code")
                    .with_annotation("com.example.Since", "1.0"),
            );

        assert_eq!(
            interface.annotations(),
            &[(Box::from("org.freedesktop.DBus.Deprecated"), Box::from("false"))]
        );

        let method = interface.method("Echo").unwrap();
        assert_eq!(method.arg_names(), &[Box::<str>::from("input")]);
        assert_eq!(method.return_names(), &[Box::<str>::from("output")]);
        assert_eq!(
            method.annotations(),
            &[(Box::from("org.freedesktop.DBus.Method.NoReply"), Box::from("false"))]
        );

        let signal = interface.signal("Status").unwrap();
        assert_eq!(signal.arg_names(), &[Box::<str>::from("code")]);
        assert_eq!(signal.annotations(), &[(Box::from("com.example.Since"), Box::from("1.0"))]);
    }
}
