use std::collections::{HashMap, HashSet};

use aware_shared::{Directive, EntityId};

/// What a client knows after applying a directive stream. Destroying an
/// entity forgets everything the client was told it contains, and a later
/// destroy of one of those contents in the same stream is a no-op.
#[derive(Default)]
pub struct ClientMirror {
    parents: HashMap<EntityId, Option<EntityId>>,
    dropped: HashSet<EntityId>,
}

impl ClientMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn knows(&self, id: &EntityId) -> bool {
        self.parents.contains_key(id)
    }

    pub fn parent(&self, id: &EntityId) -> Option<EntityId> {
        self.parents.get(id).copied().flatten()
    }

    pub fn known(&self) -> Vec<EntityId> {
        let mut known: Vec<EntityId> = self.parents.keys().copied().collect();
        known.sort();
        known
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Applies `stream`, failing on the first directive a real client could
    /// not make sense of.
    pub fn apply(&mut self, stream: &[Directive]) -> Result<(), String> {
        self.dropped.clear();
        for directive in stream {
            match directive {
                Directive::CreateEntity { id, .. } => {
                    self.dropped.remove(id);
                    if self.parents.insert(*id, None).is_some() {
                        return Err(format!("{} created while already known", id));
                    }
                }
                Directive::Containment { child, parent, .. } => {
                    self.require(child, directive)?;
                    if !self.knows(parent) {
                        return Err(format!("{} placed in unknown container {}", child, parent));
                    }
                    self.parents.insert(*child, Some(*parent));
                }
                Directive::DestroyEntity(id) => {
                    if self.dropped.remove(id) {
                        continue;
                    }
                    self.require(id, directive)?;
                    self.forget(id);
                }
                Directive::Transform { .. } | Directive::TransformWithParent { .. } => {}
                other => self.require(&other.entity(), other)?,
            }
        }
        Ok(())
    }

    fn require(&self, id: &EntityId, directive: &Directive) -> Result<(), String> {
        if self.knows(id) {
            Ok(())
        } else {
            Err(format!("{} refers to unknown entity {}", directive.name(), id))
        }
    }

    fn forget(&mut self, id: &EntityId) {
        let mut gone = HashSet::new();
        gone.insert(*id);
        // children may be announced in any order, so sweep until stable
        loop {
            let before = gone.len();
            for (child, parent) in &self.parents {
                if let Some(parent) = parent {
                    if gone.contains(parent) {
                        gone.insert(*child);
                    }
                }
            }
            if gone.len() == before {
                break;
            }
        }
        self.parents.retain(|known, _| !gone.contains(known));
        gone.remove(id);
        self.dropped.extend(gone);
    }
}
