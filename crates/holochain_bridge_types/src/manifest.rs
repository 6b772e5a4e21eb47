//! The part of an app's manifest that bridging cares about: which zomes exist
//! and which of their functions are flagged as callable from other apps.

use std::borrow::Cow;

/// The name of a zome within an app.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct ZomeName(pub Cow<'static, str>);

impl ZomeName {
    /// Accessor
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for ZomeName {
    fn from(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }
}

impl From<String> for ZomeName {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

/// The name of a function within a zome.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct FunctionName(pub String);

impl FunctionName {
    /// Accessor
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FunctionName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FunctionName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The bridging view of an app manifest, usually read from the "zomes"
/// section of the app's yaml.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AppManifest {
    /// The friendly name of the app.
    pub name: String,

    /// The zomes of this app. Order is preserved but has no bearing on
    /// bridging.
    #[serde(default)]
    pub zomes: Vec<ZomeManifest>,
}

/// A single zome and its functions
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ZomeManifest {
    /// Name of the zome
    pub name: ZomeName,

    /// Functions defined by the zome
    #[serde(default)]
    pub functions: Vec<ZomeFnManifest>,
}

/// A single zome function declaration
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ZomeFnManifest {
    /// Name of the function
    pub name: FunctionName,

    /// Whether other apps may call this function over a bridge
    #[serde(default)]
    pub bridged: bool,
}

impl AppManifest {
    /// Constructor
    pub fn new(name: impl Into<String>, zomes: Vec<ZomeManifest>) -> Self {
        Self {
            name: name.into(),
            zomes,
        }
    }

    /// Look up a zome by name
    pub fn zome(&self, zome_name: &ZomeName) -> Option<&ZomeManifest> {
        self.zomes.iter().find(|z| &z.name == zome_name)
    }
}

impl ZomeManifest {
    /// Constructor
    pub fn new(name: impl Into<ZomeName>, functions: Vec<ZomeFnManifest>) -> Self {
        Self {
            name: name.into(),
            functions,
        }
    }

    /// The functions of this zome which are flagged as bridged
    pub fn bridged_functions(&self) -> impl Iterator<Item = &FunctionName> {
        self.functions
            .iter()
            .filter(|f| f.bridged)
            .map(|f| &f.name)
    }
}

impl ZomeFnManifest {
    /// A function other apps may call
    pub fn bridged(name: impl Into<FunctionName>) -> Self {
        Self {
            name: name.into(),
            bridged: true,
        }
    }

    /// A function only this app may call
    pub fn local(name: impl Into<FunctionName>) -> Self {
        Self {
            name: name.into(),
            bridged: false,
        }
    }
}
