//! Model definitions for the LaForge Model AST.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::{Field, Hook, Ident, Policy, PolicyAction, Relation, Span};

/// A model definition (maps to a database table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Model name (PascalCase).
    pub name: Ident,
    /// Scalar fields in declaration order.
    pub fields: IndexMap<SmolStr, Field>,
    /// Relations to other models.
    pub relations: Vec<Relation>,
    /// Row-level policies, at most one per action.
    pub policies: Vec<Policy>,
    /// Lifecycle hooks, bodies carried opaquely.
    pub hooks: Vec<Hook>,
    /// Source location.
    pub span: Span,
}

impl Model {
    /// Create a new empty model.
    pub fn new(name: Ident, span: Span) -> Self {
        Self {
            name,
            fields: IndexMap::new(),
            relations: vec![],
            policies: vec![],
            hooks: vec![],
            span,
        }
    }

    /// Get the model name as a string.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Add a field. Returns the displaced field if the name was already
    /// taken, so callers can reject duplicates.
    pub fn add_field(&mut self, field: Field) -> Option<Field> {
        self.fields.insert(field.name.name.clone(), field)
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Add a relation.
    pub fn add_relation(&mut self, relation: Relation) {
        self.relations.push(relation);
    }

    /// Get a relation by name.
    pub fn get_relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name() == name)
    }

    /// Add a policy. Duplicate actions are rejected by the validator.
    pub fn add_policy(&mut self, policy: Policy) {
        self.policies.push(policy);
    }

    /// Get the policy guarding an action, if declared.
    pub fn policy(&self, action: PolicyAction) -> Option<&Policy> {
        self.policies.iter().find(|p| p.action == action)
    }

    /// Add a lifecycle hook.
    pub fn add_hook(&mut self, hook: Hook) {
        self.hooks.push(hook);
    }

    /// The primary key field. Validated models have exactly one.
    pub fn primary_key(&self) -> Option<&Field> {
        self.fields.values().find(|f| f.primary_key)
    }

    /// The tenant partition field, if any.
    pub fn tenant_field(&self) -> Option<&Field> {
        self.fields.values().find(|f| f.tenant)
    }
}

/// A validated set of models: the canonical Model AST for one domain file.
///
/// Models keep their source declaration order; all emitters are stable
/// with respect to it. The domain is immutable once validation finishes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Domain {
    /// Models in declaration order.
    pub models: IndexMap<SmolStr, Model>,
}

impl Domain {
    /// Create an empty domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model. Returns the displaced model on a duplicate name.
    pub fn add_model(&mut self, model: Model) -> Option<Model> {
        self.models.insert(model.name.name.clone(), model)
    }

    /// Get a model by name.
    pub fn get_model(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    /// Get a model by name, mutably.
    pub fn get_model_mut(&mut self, name: &str) -> Option<&mut Model> {
        self.models.get_mut(name)
    }

    /// Get the declaration index of a model.
    pub fn model_index(&self, name: &str) -> Option<usize> {
        self.models.get_index_of(name)
    }

    /// Get a model by declaration index.
    pub fn model_at(&self, index: usize) -> Option<&Model> {
        self.models.get_index(index).map(|(_, m)| m)
    }

    /// Resolve a relation's target model through its index.
    pub fn relation_target(&self, relation: &Relation) -> Option<&Model> {
        relation.target_index.and_then(|i| self.model_at(i))
    }

    /// Iterate over models in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the domain has no models.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{RelationKind, ScalarType};

    fn span() -> Span {
        Span::new(0, 1)
    }

    fn make_model(name: &str) -> Model {
        Model::new(Ident::new(name, span()), span())
    }

    fn make_field(name: &str, ty: ScalarType) -> Field {
        Field::new(Ident::new(name, span()), ty, span())
    }

    // ==================== Model Tests ====================

    #[test]
    fn test_model_add_field_detects_duplicates() {
        let mut model = make_model("User");
        assert!(model.add_field(make_field("id", ScalarType::Uuid)).is_none());
        assert!(
            model
                .add_field(make_field("id", ScalarType::String))
                .is_some()
        );
    }

    #[test]
    fn test_model_field_order_preserved() {
        let mut model = make_model("User");
        model.add_field(make_field("id", ScalarType::Uuid));
        model.add_field(make_field("email", ScalarType::String));
        model.add_field(make_field("createdAt", ScalarType::DateTime));

        let names: Vec<&str> = model.fields.values().map(|f| f.name()).collect();
        assert_eq!(names, vec!["id", "email", "createdAt"]);
    }

    #[test]
    fn test_model_primary_key_lookup() {
        let mut model = make_model("User");
        model.add_field(make_field("id", ScalarType::Uuid).primary_key());
        model.add_field(make_field("email", ScalarType::String));

        assert_eq!(model.primary_key().unwrap().name(), "id");
        assert!(model.tenant_field().is_none());
    }

    #[test]
    fn test_model_tenant_field_lookup() {
        let mut model = make_model("Note");
        model.add_field(make_field("id", ScalarType::Uuid).primary_key());
        model.add_field(make_field("tenantId", ScalarType::Uuid).tenant());

        assert_eq!(model.tenant_field().unwrap().name(), "tenantId");
    }

    #[test]
    fn test_model_get_relation() {
        let mut model = make_model("User");
        model.add_relation(Relation::new(
            Ident::new("team", span()),
            RelationKind::BelongsTo,
            "Team",
            span(),
        ));

        assert!(model.get_relation("team").is_some());
        assert!(model.get_relation("org").is_none());
    }

    // ==================== Domain Tests ====================

    #[test]
    fn test_domain_declaration_order() {
        let mut domain = Domain::new();
        domain.add_model(make_model("Team"));
        domain.add_model(make_model("User"));
        domain.add_model(make_model("Post"));

        let names: Vec<&str> = domain.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["Team", "User", "Post"]);
        assert_eq!(domain.model_index("User"), Some(1));
        assert_eq!(domain.model_at(2).unwrap().name(), "Post");
    }

    #[test]
    fn test_domain_duplicate_model_detected() {
        let mut domain = Domain::new();
        assert!(domain.add_model(make_model("User")).is_none());
        assert!(domain.add_model(make_model("User")).is_some());
    }

    #[test]
    fn test_domain_relation_target_by_index() {
        let mut domain = Domain::new();
        domain.add_model(make_model("Team"));
        domain.add_model(make_model("User"));

        let mut rel = Relation::new(
            Ident::new("team", span()),
            RelationKind::BelongsTo,
            "Team",
            span(),
        );
        rel.target_index = domain.model_index("Team");

        assert_eq!(domain.relation_target(&rel).unwrap().name(), "Team");
    }
}
