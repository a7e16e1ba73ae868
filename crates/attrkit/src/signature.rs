//! Attribute signatures.
//!
//! A [`Signature`] classifies a field (positional or named), says whether it
//! must be supplied and whether it accepts `nil`, and records the visibility
//! of its generated reader and writer.
//!
//! Signatures are built from a loose option map, the way a declaration layer
//! hands them over, and validated eagerly:
//!
//! | Option | Accepts | Default |
//! |--------|---------|---------|
//! | `kind` | `"positional"` \| `"named"` | required |
//! | `position` | non-negative integer or `null` | `null` |
//! | `nilable` | boolean | `true` |
//! | `required` | boolean | `false` |
//! | `reader` | `"public"` \| `"protected"` \| `"private"` | `"public"` |
//! | `writer` | `"public"` \| `"protected"` \| `"private"` | `"public"` |
//!
//! Defaults for the last four come from [`SignatureDefaults`], which a
//! [`crate::registry::Registry`] derives from its configuration. Only the
//! options that were explicitly given are remembered, so merging two
//! signatures lets the later declaration override exactly what it spelled out.

use crate::error::ConfigurationError;
use crate::value::inspect;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Whether a field is supplied by position or by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Positional,
    Named,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Positional => "positional",
            Kind::Named => "named",
        }
    }
}

impl FromStr for Kind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positional" => Ok(Kind::Positional),
            "named" => Ok(Kind::Named),
            other => Err(ConfigurationError::InvalidKind(other.to_string())),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility of a generated reader or writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }

    /// Private in the wide sense: anything that is not public.
    pub fn is_restricted(&self) -> bool {
        matches!(self, Visibility::Private | Visibility::Protected)
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "protected" => Ok(Visibility::Protected),
            "private" => Ok(Visibility::Private),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fallbacks for options a declaration leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureDefaults {
    pub nilable: bool,
    pub required: bool,
    pub reader: Visibility,
    pub writer: Visibility,
}

impl Default for SignatureDefaults {
    fn default() -> Self {
        Self {
            nilable: true,
            required: false,
            reader: Visibility::Public,
            writer: Visibility::Public,
        }
    }
}

/// Option keys a signature understands.
pub const OPTION_KEYS: &[&str] = &["kind", "position", "nilable", "required", "reader", "writer"];

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    kind: Kind,
    position: Option<usize>,
    nilable: bool,
    required: bool,
    reader: Visibility,
    writer: Visibility,
    options: Map<String, Value>,
    defaults: SignatureDefaults,
}

impl Signature {
    /// A signature of the given kind with every other option defaulted.
    pub fn new(kind: Kind) -> Self {
        let defaults = SignatureDefaults::default();
        let mut options = Map::new();
        options.insert("kind".into(), Value::from(kind.as_str()));
        Self {
            kind,
            position: None,
            nilable: defaults.nilable,
            required: defaults.required,
            reader: defaults.reader,
            writer: defaults.writer,
            options,
            defaults,
        }
    }

    /// Build a signature from raw options using the built-in defaults.
    pub fn from_options(options: Map<String, Value>) -> Result<Self, ConfigurationError> {
        Self::with_defaults(options, SignatureDefaults::default())
    }

    /// Build a signature from raw options, filling omitted flags from `defaults`.
    pub fn with_defaults(
        options: Map<String, Value>,
        defaults: SignatureDefaults,
    ) -> Result<Self, ConfigurationError> {
        if let Some(unknown) = options.keys().find(|k| !OPTION_KEYS.contains(&k.as_str())) {
            return Err(ConfigurationError::UnknownOption(unknown.clone()));
        }

        let kind = match options.get("kind") {
            None | Some(Value::Null) => return Err(ConfigurationError::MissingOption("kind")),
            Some(Value::String(s)) => s.parse::<Kind>()?,
            Some(other) => return Err(ConfigurationError::InvalidKind(inspect(other))),
        };

        let position = match options.get("position") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) if n.is_u64() => n
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| ConfigurationError::InvalidPosition(n.to_string()))?,
            Some(other) => return Err(ConfigurationError::InvalidPosition(inspect(other))),
        };

        Ok(Self {
            kind,
            position,
            nilable: flag(&options, "nilable", defaults.nilable)?,
            required: flag(&options, "required", defaults.required)?,
            reader: visibility(&options, "reader", defaults.reader)?,
            writer: visibility(&options, "writer", defaults.writer)?,
            options,
            defaults,
        })
    }

    /// Combine with a later declaration: its explicit options win, the result
    /// is validated again.
    pub fn merge(&self, other: &Signature) -> Result<Self, ConfigurationError> {
        let mut options = self.options.clone();
        options.extend(other.options.clone());
        Self::with_defaults(options, other.defaults)
    }

    /// Options that were explicitly given.
    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn defaults(&self) -> SignatureDefaults {
        self.defaults
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn is_positional(&self) -> bool {
        self.kind == Kind::Positional
    }

    pub fn is_named(&self) -> bool {
        self.kind == Kind::Named
    }

    pub fn is_nilable(&self) -> bool {
        self.nilable
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_optional(&self) -> bool {
        !self.required
    }

    pub fn read_visibility(&self) -> Visibility {
        self.reader
    }

    pub fn write_visibility(&self) -> Visibility {
        self.writer
    }

    pub fn is_public_read(&self) -> bool {
        self.reader == Visibility::Public
    }

    pub fn is_protected_read(&self) -> bool {
        self.reader == Visibility::Protected
    }

    /// Private or protected reader.
    pub fn is_private_read(&self) -> bool {
        self.reader.is_restricted()
    }

    pub fn is_public_write(&self) -> bool {
        self.writer == Visibility::Public
    }

    pub fn is_protected_write(&self) -> bool {
        self.writer == Visibility::Protected
    }

    /// Private or protected writer.
    pub fn is_private_write(&self) -> bool {
        self.writer.is_restricted()
    }

    /// Both reader and writer are public.
    pub fn is_public(&self) -> bool {
        self.is_public_read() && self.is_public_write()
    }

    /// Both reader and writer are restricted.
    pub fn is_private(&self) -> bool {
        self.is_private_read() && self.is_private_write()
    }
}

fn flag(options: &Map<String, Value>, key: &str, default: bool) -> Result<bool, ConfigurationError> {
    match options.get(key) {
        None => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(ConfigurationError::NotBoolean {
            key: key.to_string(),
            value: inspect(other),
        }),
    }
}

fn visibility(
    options: &Map<String, Value>,
    key: &str,
    default: Visibility,
) -> Result<Visibility, ConfigurationError> {
    let invalid = |value: String| ConfigurationError::InvalidVisibility {
        key: key.to_string(),
        value,
    };
    match options.get(key) {
        None => Ok(default),
        Some(Value::String(s)) => s.parse().map_err(|_| invalid(s.clone())),
        Some(other) => Err(invalid(inspect(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_defaults_for_a_bare_kind() {
        let sig = Signature::from_options(options(json!({"kind": "named"}))).unwrap();
        assert!(sig.is_named());
        assert!(!sig.is_positional());
        assert!(sig.is_nilable());
        assert!(sig.is_optional());
        assert!(sig.is_public());
        assert_eq!(sig.position(), None);
        assert_eq!(sig, Signature::new(Kind::Named));
    }

    #[test]
    fn test_explicit_options_are_parsed() {
        let sig = Signature::from_options(options(json!({
            "kind": "positional",
            "position": 2,
            "nilable": false,
            "required": true,
            "reader": "protected",
            "writer": "private",
        })))
        .unwrap();
        assert!(sig.is_positional());
        assert_eq!(sig.position(), Some(2));
        assert!(!sig.is_nilable());
        assert!(sig.is_required());
        assert!(sig.is_protected_read());
        assert!(sig.is_private_read());
        assert!(!sig.is_public_read());
        assert!(sig.is_private_write());
        assert!(!sig.is_protected_write());
        assert!(sig.is_private());
        assert!(!sig.is_public());
    }

    #[test]
    fn test_missing_kind_fails() {
        let err = Signature::from_options(options(json!({"required": true}))).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingOption("kind"));
    }

    #[test]
    fn test_invalid_kind_fails() {
        let err = Signature::from_options(options(json!({"kind": "splat"}))).unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidKind("splat".into()));

        let err = Signature::from_options(options(json!({"kind": 1}))).unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidKind("1".into()));
    }

    #[test]
    fn test_invalid_position_fails() {
        for bad in [json!(-1), json!(1.5), json!("0")] {
            let err = Signature::from_options(options(json!({"kind": "positional", "position": bad})))
                .unwrap_err();
            assert!(matches!(err, ConfigurationError::InvalidPosition(_)));
        }
    }

    #[test]
    fn test_null_position_is_accepted() {
        let sig =
            Signature::from_options(options(json!({"kind": "positional", "position": null}))).unwrap();
        assert_eq!(sig.position(), None);
    }

    #[test]
    fn test_non_boolean_flags_fail() {
        let err = Signature::from_options(options(json!({"kind": "named", "nilable": "yes"})))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::NotBoolean {
                key: "nilable".into(),
                value: "\"yes\"".into()
            }
        );
        let err =
            Signature::from_options(options(json!({"kind": "named", "required": 1}))).unwrap_err();
        assert!(matches!(err, ConfigurationError::NotBoolean { key, .. } if key == "required"));
    }

    #[test]
    fn test_invalid_visibility_fails() {
        let err = Signature::from_options(options(json!({"kind": "named", "reader": "secret"})))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidVisibility {
                key: "reader".into(),
                value: "secret".into()
            }
        );
    }

    #[test]
    fn test_unknown_option_fails() {
        let err =
            Signature::from_options(options(json!({"kind": "named", "optional": true}))).unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownOption("optional".into()));
    }

    #[test]
    fn test_configured_defaults_fill_omitted_flags() {
        let defaults = SignatureDefaults {
            nilable: false,
            required: true,
            reader: Visibility::Private,
            writer: Visibility::Protected,
        };
        let sig = Signature::with_defaults(options(json!({"kind": "named"})), defaults).unwrap();
        assert!(!sig.is_nilable());
        assert!(sig.is_required());
        assert_eq!(sig.read_visibility(), Visibility::Private);
        assert_eq!(sig.write_visibility(), Visibility::Protected);
        assert_eq!(sig.options().len(), 1);
    }

    #[test]
    fn test_merge_prefers_explicit_options_of_the_later_signature() {
        let base = Signature::from_options(options(json!({
            "kind": "named",
            "nilable": false,
            "reader": "private",
        })))
        .unwrap();
        let later =
            Signature::from_options(options(json!({"kind": "named", "reader": "public"}))).unwrap();

        let merged = base.merge(&later).unwrap();
        assert!(!merged.is_nilable(), "unspecified options are kept");
        assert!(merged.is_public_read(), "explicit options override");
    }

    #[test]
    fn test_merge_can_change_kind() {
        let base = Signature::new(Kind::Positional);
        let later = Signature::new(Kind::Named);
        assert!(base.merge(&later).unwrap().is_named());
    }

    #[test]
    fn test_kind_and_visibility_parse_and_display() {
        assert_eq!("positional".parse::<Kind>().unwrap(), Kind::Positional);
        assert_eq!(Kind::Named.to_string(), "named");
        assert_eq!("protected".parse::<Visibility>(), Ok(Visibility::Protected));
        assert_eq!(Visibility::Private.to_string(), "private");
        assert!(Visibility::Protected.is_restricted());
        assert!(!Visibility::Public.is_restricted());
    }
}
