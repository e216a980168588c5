use serde::{Deserialize, Serialize};

use rentstock_core::{patch, require_non_blank, CategoryId, DomainResult, Entity, Patch};

/// Product grouping (e.g. tools, fasteners).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }
}

impl Category {
    pub fn apply_changes(&mut self, changes: CategoryChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        patch::apply(&mut self.description, changes.description);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewCategory {
    pub fn validate(&self) -> DomainResult<()> {
        require_non_blank("name", &self.name)
    }

    pub fn into_category(self, id: CategoryId) -> Category {
        Category {
            id,
            name: self.name,
            description: self.description,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryChanges {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub description: Patch<String>,
}

impl CategoryChanges {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            require_non_blank("name", name)?;
        }
        Ok(())
    }
}
