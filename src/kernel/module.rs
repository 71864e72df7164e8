use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub Uuid);

impl ModuleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ModuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the kernel needs to know about a feature module.
///
/// Liveness is rechecked whenever a request or action is consumed, so a module
/// that was disabled after submitting never gets to act.
pub trait Module {
    fn id(&self) -> ModuleId;
    fn is_active(&self) -> bool;
}

/// Shared handle stored alongside requests and deferred actions.
pub type ModuleHandle = Rc<dyn Module>;

/// Stock toggleable module.
#[derive(Debug)]
pub struct FeatureModule {
    id: ModuleId,
    name: String,
    enabled: Cell<bool>,
}

impl FeatureModule {
    pub fn new(name: &str) -> Self {
        Self {
            id: ModuleId::new(),
            name: name.to_string(),
            enabled: Cell::new(false),
        }
    }

    /// Builds an enabled module already wrapped for submission.
    pub fn enabled(name: &str) -> Rc<Self> {
        let module = Self::new(name);
        module.enable();
        Rc::new(module)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enable(&self) {
        self.enabled.set(true);
    }

    pub fn disable(&self) {
        self.enabled.set(false);
    }

    pub fn toggle(&self) {
        self.enabled.set(!self.enabled.get());
    }
}

impl Module for FeatureModule {
    fn id(&self) -> ModuleId {
        self.id
    }

    fn is_active(&self) -> bool {
        self.enabled.get()
    }
}

impl fmt::Display for FeatureModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Module{}", self.name)
    }
}
