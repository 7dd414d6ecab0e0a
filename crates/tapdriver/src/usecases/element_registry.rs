//! Opaque element handles scoped to a session.
//!
//! The registry is a bidirectional map: each live element reference has at
//! most one handle and each handle names exactly one reference. Handles
//! outlive nothing: `clear` drops every mapping at once, after which any
//! previously issued handle resolves as stale.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::ElementId;
use crate::usecases::ports::{DriverError, ElementRef};

/// Strategy for minting a new handle.
pub trait HandleMinter: Send + Sync {
    fn mint(&self, element: &ElementRef) -> ElementId;
}

/// Random UUID handles, independent of the context that produced the element.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomMinter;

impl HandleMinter for RandomMinter {
    fn mint(&self, _element: &ElementRef) -> ElementId {
        ElementId::new(uuid::Uuid::new_v4().to_string())
    }
}

/// Reuses the platform's non-negative view id when present, else a UUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformIdMinter;

impl HandleMinter for PlatformIdMinter {
    fn mint(&self, element: &ElementRef) -> ElementId {
        match element.platform_id() {
            Some(id) if id >= 0 => ElementId::new(id.to_string()),
            _ => RandomMinter.mint(element),
        }
    }
}

/// Which minter new sessions use, picked once per server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementIdStyle {
    #[default]
    Random,
    PlatformId,
}

impl ElementIdStyle {
    pub fn minter(self) -> Arc<dyn HandleMinter> {
        match self {
            ElementIdStyle::Random => Arc::new(RandomMinter),
            ElementIdStyle::PlatformId => Arc::new(PlatformIdMinter),
        }
    }
}

impl FromStr for ElementIdStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" | "uuid" => Ok(ElementIdStyle::Random),
            "platform" | "view-id" => Ok(ElementIdStyle::PlatformId),
            other => Err(format!("unknown element id style '{other}'")),
        }
    }
}

pub struct ElementRegistry {
    by_id: HashMap<ElementId, ElementRef>,
    by_ref: HashMap<ElementRef, ElementId>,
    minter: Arc<dyn HandleMinter>,
    clears: u64,
}

impl ElementRegistry {
    pub fn new(minter: Arc<dyn HandleMinter>) -> Self {
        Self {
            by_id: HashMap::new(),
            by_ref: HashMap::new(),
            minter,
            clears: 0,
        }
    }

    /// Registers `element`, returning its existing handle if already known.
    pub fn put(&mut self, element: ElementRef) -> ElementId {
        if let Some(id) = self.by_ref.get(&element) {
            return id.clone();
        }
        let mut id = self.minter.mint(&element);
        if self.by_id.contains_key(&id) {
            // Minted id already names another element; keep handles unique.
            id = RandomMinter.mint(&element);
        }
        self.by_id.insert(id.clone(), element.clone());
        self.by_ref.insert(element, id.clone());
        id
    }

    pub fn resolve(&self, id: &str) -> Result<ElementRef, DriverError> {
        self.by_id
            .get(id)
            .cloned()
            .ok_or_else(|| DriverError::stale(id))
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_ref.clear();
        self.clears += 1;
    }

    /// How many times the registry has been cleared.
    pub fn clear_count(&self) -> u64 {
        self.clears
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::new(Arc::new(RandomMinter))
    }
}

impl std::fmt::Debug for ElementRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementRegistry")
            .field("len", &self.by_id.len())
            .field("clears", &self.clears)
            .finish()
    }
}
