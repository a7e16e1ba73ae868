//! # Attributes
//!
//! An [`Attribute`] is the descriptor of one named field. It bundles a
//! [`Signature`] with a [`Coercer`], a [`Validator`] and a [`Callback`], plus
//! the field's identity (name, owner, description, default).
//!
//! ## The assignment pipeline
//!
//! [`Attribute::apply`] is the only way a value reaches an [`Instance`]:
//!
//! 1. Read the current stored value (`null` when unset) as the old value.
//! 2. Replace the sentinel with the default: a stored value as-is, or a
//!    generator called with the instance, afresh on every application.
//! 3. Coerce.
//! 4. Validate.
//! 5. Store (the sentinel is stored as `null`).
//! 6. Notify callbacks with `(old, stored)`.
//!
//! A failure in steps 2-4 returns before anything is stored. Defaults go
//! through coercion and validation exactly like explicit values.
//!
//! ## Declarations
//!
//! Attributes are built from a [`Declaration`], the option bag a declaration
//! layer fills in:
//!
//! ```
//! use attrkit::attribute::Declaration;
//! use attrkit::policy::Coercion;
//! use serde_json::json;
//!
//! let name = Declaration::positional("User", "name")
//!     .required(true)
//!     .nilable(false)
//!     .coerce(Coercion::function("upcase", |_, v| {
//!         Ok(json!(v.as_str().unwrap_or_default().to_uppercase()))
//!     }))
//!     .build()
//!     .unwrap();
//!
//! assert!(name.signature().is_required());
//! ```

use crate::error::{ConfigurationError, Error, HandlerResult, Result};
use crate::input::Input;
use crate::instance::Instance;
use crate::owner::TypeName;
use crate::policy::{Callback, Check, Coercer, Coercion, Observer, Target, Validator};
use crate::signature::{Kind, Signature, SignatureDefaults, Visibility};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

type GenerateFn = dyn Fn(&Instance) -> HandlerResult<Value> + Send + Sync;

/// What an attribute falls back to when nothing is supplied.
#[derive(Clone, Default)]
pub enum DefaultValue {
    /// No default: the sentinel flows on to validation.
    #[default]
    Undefined,
    Value(Value),
    /// Called with the instance on every application that needs a default.
    Generator(Arc<GenerateFn>),
}

impl DefaultValue {
    pub fn value(value: impl Into<Value>) -> Self {
        DefaultValue::Value(value.into())
    }

    pub fn generator<F>(f: F) -> Self
    where
        F: Fn(&Instance) -> HandlerResult<Value> + Send + Sync + 'static,
    {
        DefaultValue::Generator(Arc::new(f))
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, DefaultValue::Undefined)
    }

    fn produce(&self, instance: &Instance) -> HandlerResult<Input> {
        match self {
            DefaultValue::Undefined => Ok(Input::Undefined),
            DefaultValue::Value(value) => Ok(Input::Value(value.clone())),
            DefaultValue::Generator(generate) => generate(instance).map(Input::Value),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Undefined => write!(f, "Undefined"),
            DefaultValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultValue::Generator(_) => write!(f, "Generator(..)"),
        }
    }
}

/// Construction options for an [`Attribute`].
///
/// `owner`, `name` and the `kind` signature option are mandatory; everything
/// else has a default.
#[derive(Debug, Clone, Default)]
pub struct Declaration {
    pub owner: String,
    pub name: Option<String>,
    pub signature: Map<String, Value>,
    pub defaults: SignatureDefaults,
    pub coercers: Vec<Coercion>,
    pub validators: Vec<Check>,
    pub callbacks: Vec<Observer>,
    pub default: DefaultValue,
    pub description: Option<String>,
}

impl Declaration {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, kind: Kind) -> Self {
        Self {
            owner: owner.into(),
            name: Some(name.into()),
            ..Default::default()
        }
        .option("kind", kind.as_str())
    }

    pub fn positional(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(owner, name, Kind::Positional)
    }

    pub fn named(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(owner, name, Kind::Named)
    }

    /// Set a raw signature option. Validated when the attribute is built.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.signature.insert(key.into(), value.into());
        self
    }

    pub fn position(self, position: usize) -> Self {
        self.option("position", position)
    }

    pub fn required(self, required: bool) -> Self {
        self.option("required", required)
    }

    pub fn nilable(self, nilable: bool) -> Self {
        self.option("nilable", nilable)
    }

    pub fn reader(self, visibility: Visibility) -> Self {
        self.option("reader", visibility.as_str())
    }

    pub fn writer(self, visibility: Visibility) -> Self {
        self.option("writer", visibility.as_str())
    }

    pub fn defaults(mut self, defaults: SignatureDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn coerce(mut self, coercion: Coercion) -> Self {
        self.coercers.push(coercion);
        self
    }

    pub fn validate(mut self, check: impl Into<Check>) -> Self {
        self.validators.push(check.into());
        self
    }

    pub fn on_change(mut self, observer: Observer) -> Self {
        self.callbacks.push(observer);
        self
    }

    pub fn default(mut self, default: DefaultValue) -> Self {
        self.default = default;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn build(self) -> Result<Attribute> {
        Attribute::construct(self)
    }
}

#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    owner: TypeName,
    description: Option<String>,
    default: DefaultValue,
    signature: Signature,
    coercer: Coercer,
    validator: Validator,
    callback: Callback,
}

impl Attribute {
    /// Build and validate an attribute. Any invalid option fails with
    /// [`Error::Configuration`] naming what was being declared.
    pub fn construct(declaration: Declaration) -> Result<Self> {
        let Declaration {
            owner,
            name,
            signature,
            defaults,
            coercers,
            validators,
            callbacks,
            default,
            description,
        } = declaration;

        let context = format!("{}#{}", owner, name.as_deref().unwrap_or("?"));
        let fail = |source: ConfigurationError| Error::configuration(context.clone(), source);

        let owner = TypeName::parse(&owner).map_err(|source| {
            fail(ConfigurationError::InvalidOwner {
                value: owner.clone(),
                source,
            })
        })?;
        let name = match name {
            None => return Err(fail(ConfigurationError::MissingOption("name"))),
            Some(name) if name.is_empty() => {
                return Err(fail(ConfigurationError::MissingOption("name")))
            }
            Some(name) if !is_attribute_name(&name) => {
                return Err(fail(ConfigurationError::InvalidName(name)))
            }
            Some(name) => name,
        };

        Ok(Self {
            signature: Signature::with_defaults(signature, defaults).map_err(&fail)?,
            coercer: Coercer::new(coercers).map_err(&fail)?,
            validator: Validator::new(validators).map_err(&fail)?,
            callback: Callback::new(callbacks),
            name,
            owner,
            description,
            default,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &TypeName {
        &self.owner
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn default_value(&self) -> &DefaultValue {
        &self.default
    }

    pub fn has_default(&self) -> bool {
        self.default.is_defined()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn coercer(&self) -> &Coercer {
        &self.coercer
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    pub fn target(&self) -> Target<'_> {
        Target::new(&self.owner, &self.name, &self.signature)
    }

    /// Run the assignment pipeline for `input` on `instance`.
    ///
    /// Pass [`Input::Undefined`] to assign the default.
    pub fn apply(&self, instance: &mut Instance, input: Input) -> Result<()> {
        let target = self.target();
        let old = instance.get(&self.name).cloned().unwrap_or(Value::Null);

        let input = match input {
            Input::Undefined => {
                self.default
                    .produce(instance)
                    .map_err(|source| Error::Default {
                        owner: target.owner_name(),
                        attribute: target.attribute_name(),
                        source,
                    })?
            }
            given => given,
        };

        let coerced = self.coercer.apply(target, instance, input)?;
        self.validator.apply(target, instance, &coerced)?;

        let stored = coerced.into_value();
        instance.store(&self.name, stored.clone());
        tracing::debug!(attribute = %target, instance = %instance.id(), "value committed");

        self.callback.apply(target, instance, &old, &stored)
    }

    /// Combine with a later declaration of the same field.
    ///
    /// The result belongs to `other`'s owner. Description, default and
    /// explicitly given signature options come from `other` when it has
    /// them; handler lists are ours followed by `other`'s.
    pub fn merge(&self, other: &Attribute) -> Result<Attribute> {
        let context = format!("{}#{}", other.owner, other.name);
        if self.name != other.name {
            return Err(Error::configuration(
                context,
                ConfigurationError::NameMismatch {
                    left: self.name.clone(),
                    right: other.name.clone(),
                },
            ));
        }

        let signature = self
            .signature
            .merge(&other.signature)
            .map_err(|source| Error::configuration(context, source))?;

        Ok(Attribute {
            name: other.name.clone(),
            owner: other.owner.clone(),
            description: other.description.clone().or_else(|| self.description.clone()),
            default: if other.has_default() {
                other.default.clone()
            } else {
                self.default.clone()
            },
            signature,
            coercer: self.coercer.merge(&other.coercer),
            validator: self.validator.merge(&other.validator),
            callback: self.callback.merge(&other.callback),
        })
    }

    /// A copy owned by `owner`. Handler lists are copied, not shared.
    pub fn duplicate_with_owner(&self, owner: &TypeName) -> Attribute {
        Attribute {
            owner: owner.clone(),
            ..self.clone()
        }
    }
}

/// Attribute names become reader/writer names: a lowercase ASCII letter or
/// underscore, then lowercase letters, digits or underscores.
fn is_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() || first == '_' => chars
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::policy::Matcher;
    use crate::value::ValueKind;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn instance(owner: &str) -> Instance {
        Instance::bare(TypeName::parse(owner).unwrap())
    }

    fn upcase() -> Coercion {
        Coercion::function("upcase", |_, v| {
            Ok(json!(v.as_str().unwrap_or_default().to_uppercase()))
        })
    }

    fn non_empty() -> Check {
        Check::predicate("length > 0", |_, v| {
            Ok(v.as_str().is_some_and(|s| !s.is_empty()))
        })
    }

    fn handle() -> Attribute {
        Declaration::positional("User", "handle")
            .required(true)
            .nilable(false)
            .coerce(upcase())
            .validate(non_empty())
            .build()
            .unwrap()
    }

    #[test]
    fn test_apply_coerces_then_stores() {
        let attr = handle();
        let mut user = instance("User");
        attr.apply(&mut user, json!("ok").into()).unwrap();
        assert_eq!(user.get("handle"), Some(&json!("OK")));
    }

    #[test]
    fn test_apply_rejects_invalid_values_without_storing() {
        let attr = handle();
        let mut user = instance("User");
        attr.apply(&mut user, json!("ok").into()).unwrap();

        let err = attr.apply(&mut user, json!("").into()).unwrap_err();
        assert!(matches!(err, Error::Rejected { .. }));
        assert_eq!(err.to_string(), "User#handle has invalid value: `\"\"`");
        assert_eq!(user.get("handle"), Some(&json!("OK")));
    }

    #[test]
    fn test_apply_without_value_or_default_is_required() {
        let attr = handle();
        let mut user = instance("User");
        let err = attr.apply(&mut user, Input::Undefined).unwrap_err();
        assert_eq!(err.to_string(), "User#handle is required");
        assert!(!user.is_assigned("handle"));
    }

    #[test]
    fn test_nil_is_rejected_before_coercion_and_validation() {
        let coerced = Arc::new(AtomicUsize::new(0));
        let counting = {
            let coerced = coerced.clone();
            Coercion::function("count", move |_, v| {
                coerced.fetch_add(1, Ordering::SeqCst);
                Ok(v)
            })
        };
        let attr = Declaration::named("User", "email")
            .nilable(false)
            .coerce(counting)
            .validate(Check::predicate("always", |_, _| Ok(true)))
            .build()
            .unwrap();
        let err = attr.apply(&mut instance("User"), Value::Null.into()).unwrap_err();
        assert_eq!(err.to_string(), "User#email cannot be nil");
        assert_eq!(coerced.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_optional_attribute_without_default_stores_nil() {
        let attr = Declaration::named("User", "nickname").build().unwrap();
        let mut user = instance("User");
        attr.apply(&mut user, Input::Undefined).unwrap();
        assert_eq!(user.get("nickname"), Some(&Value::Null));
    }

    #[test]
    fn test_static_default_is_used_as_is() {
        let attr = Declaration::named("User", "role")
            .default(DefaultValue::value("member"))
            .build()
            .unwrap();
        let mut a = instance("User");
        let mut b = instance("User");
        attr.apply(&mut a, Input::Undefined).unwrap();
        attr.apply(&mut b, Input::Undefined).unwrap();
        assert_eq!(a.get("role"), b.get("role"));
        assert_eq!(a.get("role"), Some(&json!("member")));
    }

    #[test]
    fn test_generator_default_runs_on_every_application() {
        let counter = Arc::new(AtomicUsize::new(0));
        let attr = {
            let counter = counter.clone();
            Declaration::named("Ticket", "serial")
                .default(DefaultValue::generator(move |_| {
                    Ok(json!(counter.fetch_add(1, Ordering::SeqCst) + 1))
                }))
                .build()
                .unwrap()
        };
        let mut first = instance("Ticket");
        let mut second = instance("Ticket");
        attr.apply(&mut first, Input::Undefined).unwrap();
        attr.apply(&mut second, Input::Undefined).unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(first.get("serial"), Some(&json!(1)));
        assert_eq!(second.get("serial"), Some(&json!(2)));
    }

    #[test]
    fn test_generator_sees_the_instance() {
        let attr = Declaration::named("User", "display")
            .default(DefaultValue::generator(|instance| {
                Ok(instance.get("handle").cloned().unwrap_or(Value::Null))
            }))
            .build()
            .unwrap();
        let mut user = instance("User");
        handle().apply(&mut user, json!("ann").into()).unwrap();
        attr.apply(&mut user, Input::Undefined).unwrap();
        assert_eq!(user.get("display"), Some(&json!("ANN")));
    }

    #[test]
    fn test_defaults_are_coerced_and_validated() {
        let attr = Declaration::named("User", "code")
            .coerce(upcase())
            .validate(Check::matcher(Matcher::pattern("^[A-Z]+$").unwrap()))
            .default(DefaultValue::value("abc"))
            .build()
            .unwrap();
        let mut user = instance("User");
        attr.apply(&mut user, Input::Undefined).unwrap();
        assert_eq!(user.get("code"), Some(&json!("ABC")));

        let bad = Declaration::named("User", "code")
            .validate(Check::matcher(ValueKind::Integer))
            .default(DefaultValue::value("abc"))
            .build()
            .unwrap();
        assert!(matches!(
            bad.apply(&mut instance("User"), Input::Undefined),
            Err(Error::Rejected { .. })
        ));
    }

    #[test]
    fn test_failing_generator_aborts_before_commit() {
        let attr = Declaration::named("User", "token")
            .default(DefaultValue::generator(|_| Err(HandlerError::new("no entropy"))))
            .build()
            .unwrap();
        let mut user = instance("User");
        let err = attr.apply(&mut user, Input::Undefined).unwrap_err();
        assert!(matches!(err, Error::Default { .. }));
        assert!(!user.is_assigned("token"));
    }

    #[test]
    fn test_coercion_failure_leaves_previous_value() {
        let attr = Declaration::named("User", "age")
            .coerce(Coercion::function("to_int", |_, v| {
                v.as_str()
                    .and_then(|s| s.parse::<i64>().ok())
                    .map(Value::from)
                    .ok_or_else(|| HandlerError::new("not a number"))
            }))
            .build()
            .unwrap();
        let mut user = instance("User");
        attr.apply(&mut user, json!("41").into()).unwrap();
        let err = attr.apply(&mut user, json!("old").into()).unwrap_err();
        assert!(matches!(err, Error::Coercion { handler, .. } if handler == "to_int"));
        assert_eq!(user.get("age"), Some(&json!(41)));
    }

    #[test]
    fn test_callbacks_receive_old_and_stored_values() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let attr = {
            let seen = seen.clone();
            Declaration::named("User", "status")
                .on_change(Observer::new("log", move |_, old, new| {
                    seen.lock().unwrap().push((old.clone(), new.clone()));
                    Ok(())
                }))
                .build()
                .unwrap()
        };
        let mut user = instance("User");
        attr.apply(&mut user, json!("draft").into()).unwrap();
        attr.apply(&mut user, json!("done").into()).unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (Value::Null, json!("draft")),
                (json!("draft"), json!("done")),
            ]
        );
    }

    #[test]
    fn test_callback_failure_reports_after_commit() {
        let attr = Declaration::named("User", "status")
            .on_change(Observer::new("audit", |_, _, _| Err(HandlerError::new("audit log down"))))
            .build()
            .unwrap();
        let mut user = instance("User");
        let err = attr.apply(&mut user, json!("done").into()).unwrap_err();
        assert!(matches!(err, Error::Callback { .. }));
        assert_eq!(user.get("status"), Some(&json!("done")));
    }

    #[test]
    fn test_construct_requires_name_and_kind() {
        let missing_name = Declaration {
            owner: "User".into(),
            ..Default::default()
        }
        .option("kind", "named");
        let err = missing_name.build().unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration { source: ConfigurationError::MissingOption("name"), .. }
        ));

        let missing_kind = Declaration {
            owner: "User".into(),
            name: Some("email".into()),
            ..Default::default()
        };
        let err = missing_kind.build().unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration { source: ConfigurationError::MissingOption("kind"), .. }
        ));
        assert_eq!(err.to_string(), "User#email: missing required option `kind`");
    }

    #[test]
    fn test_construct_rejects_invalid_owner() {
        let err = Declaration::named("user", "email").build().unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration { source: ConfigurationError::InvalidOwner { .. }, .. }
        ));
    }

    #[test]
    fn test_construct_rejects_invalid_names_and_options() {
        let err = Declaration::named("User", "Email").build().unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration { source: ConfigurationError::InvalidName(_), .. }
        ));

        let err = Declaration::named("User", "email")
            .option("reader", "hidden")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration { source: ConfigurationError::InvalidVisibility { .. }, .. }
        ));
    }

    #[test]
    fn test_has_default_tracks_the_sentinel() {
        assert!(!Declaration::named("User", "a").build().unwrap().has_default());
        assert!(Declaration::named("User", "a")
            .default(DefaultValue::value(Value::Null))
            .build()
            .unwrap()
            .has_default());
    }

    #[test]
    fn test_merge_concatenates_validators_in_order() {
        let v1 = Check::predicate("v1", |_, _| Ok(true));
        let v2 = Check::predicate("v2", |_, _| Ok(true));
        let a = Declaration::named("User", "email").validate(v1).build().unwrap();
        let b = Declaration::named("Admin", "email").validate(v2).build().unwrap();

        let merged = a.merge(&b).unwrap();
        let labels: Vec<_> = merged.validator().handlers().iter().map(Check::label).collect();
        assert_eq!(labels, vec!["v1", "v2"]);
        assert_eq!(merged.owner().as_str(), "Admin");
    }

    #[test]
    fn test_merge_prefers_the_later_declaration() {
        let a = Declaration::named("User", "email")
            .nilable(false)
            .reader(Visibility::Private)
            .describe("primary address")
            .default(DefaultValue::value("a@example.com"))
            .build()
            .unwrap();
        let b = Declaration::named("User", "email")
            .reader(Visibility::Public)
            .build()
            .unwrap();

        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.description(), Some("primary address"));
        assert!(merged.has_default(), "default kept when the later one has none");
        assert!(!merged.signature().is_nilable());
        assert!(merged.signature().is_public_read());

        let c = Declaration::named("User", "email")
            .describe("login")
            .default(DefaultValue::value("c@example.com"))
            .build()
            .unwrap();
        let merged = a.merge(&c).unwrap();
        assert_eq!(merged.description(), Some("login"));
        assert!(matches!(merged.default_value(), DefaultValue::Value(v) if v == &json!("c@example.com")));
    }

    #[test]
    fn test_merge_rejects_different_names() {
        let a = Declaration::named("User", "email").build().unwrap();
        let b = Declaration::named("User", "phone").build().unwrap();
        assert!(matches!(
            a.merge(&b),
            Err(Error::Configuration { source: ConfigurationError::NameMismatch { .. }, .. })
        ));
    }

    #[test]
    fn test_duplicate_with_owner_rebinds_and_copies() {
        let attr = handle();
        let admin = TypeName::parse("Admin").unwrap();
        let copy = attr.duplicate_with_owner(&admin);
        assert_eq!(copy.owner(), &admin);
        assert_eq!(attr.owner().as_str(), "User");
        assert_eq!(copy.name(), "handle");
        assert_eq!(copy.validator().handlers().len(), 1);

        let mut account = Instance::bare(admin);
        let err = copy.apply(&mut account, Input::Undefined).unwrap_err();
        assert_eq!(err.to_string(), "Admin#handle is required");
    }

    #[test]
    fn test_attribute_names() {
        assert!(is_attribute_name("email"));
        assert!(is_attribute_name("_secret"));
        assert!(is_attribute_name("line2"));
        assert!(!is_attribute_name("Email"));
        assert!(!is_attribute_name("2fa"));
        assert!(!is_attribute_name("first-name"));
    }
}
