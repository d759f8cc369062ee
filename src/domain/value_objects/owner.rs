use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ownership scope of a store or chat. Global stores are shared and may be
/// bound to any chat as auxiliary stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "tenant_id", rename_all = "snake_case")]
pub enum Owner {
    Global,
    Tenant(Uuid),
}

impl Owner {
    pub fn from_tenant_id(tenant_id: Option<Uuid>) -> Self {
        match tenant_id {
            Some(id) => Owner::Tenant(id),
            None => Owner::Global,
        }
    }

    pub fn tenant_id(&self) -> Option<Uuid> {
        match self {
            Owner::Global => None,
            Owner::Tenant(id) => Some(*id),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Owner::Global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_column_mapping() {
        let tenant = Uuid::new_v4();
        assert_eq!(Owner::from_tenant_id(None), Owner::Global);
        assert_eq!(Owner::from_tenant_id(Some(tenant)).tenant_id(), Some(tenant));
        assert!(Owner::Global.is_global());
    }
}
