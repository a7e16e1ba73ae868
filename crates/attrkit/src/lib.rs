//! # Attrkit Architecture
//!
//! Attrkit is an **attribute descriptor engine**. A type declares its fields as
//! [`attribute::Attribute`]s; every value written to an instance, whether at
//! construction or later, passes through the same pipeline of coercion,
//! validation, commit and change callbacks.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Facade (accessors.rs, initializer.rs)                      │
//! │  - Builds instances from positional and named inputs        │
//! │  - Public readers and writers with visibility checks        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Declaration (registry.rs, set.rs)                          │
//! │  - Explicit per-type registry, subclassing                  │
//! │  - Canonically ordered attribute sets, merge on redeclare   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Descriptor (attribute.rs, signature.rs)                    │
//! │  - One field: name, owner, default, signature               │
//! │  - apply: default → coerce → validate → commit → notify     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Policies (policy/)                                         │
//! │  - Coercer: fail-fast transformation                        │
//! │  - Validator: aggregate checks, plain rejections            │
//! │  - Callback: observers run after commit                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Absent vs. nil
//!
//! "No value supplied" and "the value `nil`" are different inputs.
//! [`input::Input::Undefined`] is the former and makes the default apply;
//! `Input::Value(Value::Null)` is the latter and is judged by the
//! signature's `nilable` flag.
//!
//! ## Quick Start
//!
//! ```
//! use attrkit::accessors::Object;
//! use attrkit::policy::{Check, Coercion};
//! use attrkit::registry::Registry;
//! use attrkit::signature::Kind;
//! use serde_json::{json, Map};
//!
//! let mut registry = Registry::new();
//! registry.declare("User").unwrap();
//! let name = registry
//!     .declaration("User", "name", Kind::Positional)
//!     .unwrap()
//!     .nilable(false)
//!     .coerce(Coercion::function("upcase", |_, v| {
//!         Ok(json!(v.as_str().unwrap_or_default().to_uppercase()))
//!     }))
//!     .validate(Check::predicate("length > 0", |_, v| {
//!         Ok(v.as_str().is_some_and(|s| !s.is_empty()))
//!     }));
//! registry.attribute("User", name).unwrap();
//!
//! let mut user = Object::new(&registry, "User", vec![json!("ok")], Map::new()).unwrap();
//! assert_eq!(user.get("name").unwrap(), &json!("OK"));
//! assert!(user.set("name", "").is_err());
//! ```
//!
//! ## Threading
//!
//! Everything is synchronous. Handlers are `Send + Sync` so declared types
//! can be shared, but an [`instance::Instance`] has no internal locking:
//! callers sharing one across threads must synchronize it themselves.
//!
//! ## Module Overview
//!
//! - [`input`]: The absent-value sentinel
//! - [`value`]: Type tags, truthiness and inspection of values
//! - [`owner`]: Owner type names and method tables
//! - [`instance`]: Per-object value storage
//! - [`signature`]: Kind, requiredness, nilability, visibility
//! - [`policy`]: Coercer, Validator, Callback and matchers
//! - [`attribute`]: The descriptor and its assignment pipeline
//! - [`set`]: Ordered attribute collections
//! - [`registry`]: Declared types and inheritance
//! - [`initializer`]: Construction from positional and named inputs
//! - [`accessors`]: Visibility-checked readers and writers
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod accessors;
pub mod attribute;
pub mod config;
pub mod error;
pub mod initializer;
pub mod input;
pub mod instance;
pub mod owner;
pub mod policy;
pub mod registry;
pub mod set;
pub mod signature;
pub mod value;

pub use attribute::{Attribute, Declaration, DefaultValue};
pub use error::{Error, Result};
pub use input::{Input, UNDEFINED};
pub use registry::{Registry, TypeDef};
pub use set::AttributeSet;
