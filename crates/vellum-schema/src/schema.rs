//! The validated, immutable admin schema.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::debug;

use crate::error::SchemaError;
use crate::merge::merge_update;
use crate::migration::check_update;
use crate::patterns::PatternCache;
use crate::published::{PublishedSchema, PublishedSchemaSpecification};
use crate::spec::{
    ComponentTypeSpecification, EntityTypeSpecification, IndexSpecification,
    PatternSpecification, SchemaSpecification,
};
use crate::update::SchemaSpecificationUpdate;
use crate::validate::validate_specification;

/// A validated schema specification.
///
/// Instances never change. [`AdminSchema::update_and_validate`] returns a new
/// instance and leaves `self` usable. Clones share the specification and its
/// memoized derivations.
#[derive(Debug, Clone)]
pub struct AdminSchema {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    spec: SchemaSpecification,
    pattern_cache: PatternCache,
    published: OnceLock<PublishedSchema>,
}

impl AdminSchema {
    /// Wrap an existing specification after validating it.
    ///
    /// # Errors
    ///
    /// Returns the first structural violation found.
    pub fn new(spec: SchemaSpecification) -> Result<Self, SchemaError> {
        validate_specification(&spec)?;
        Ok(Self::from_validated(spec))
    }

    /// The empty schema at version 0.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_validated(SchemaSpecification::default())
    }

    fn from_validated(spec: SchemaSpecification) -> Self {
        let pattern_cache = PatternCache::new(spec.patterns.len());
        Self {
            inner: Arc::new(Inner {
                spec,
                pattern_cache,
                published: OnceLock::new(),
            }),
        }
    }

    /// Apply `update` to the empty schema.
    ///
    /// # Errors
    ///
    /// Same as [`AdminSchema::update_and_validate`].
    pub fn create_and_validate(update: &SchemaSpecificationUpdate) -> Result<Self, SchemaError> {
        Self::empty().update_and_validate(update)
    }

    /// Produce the next schema version from `update`.
    ///
    /// When the update changes nothing, `self` is returned as is and the
    /// version does not move.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::BadRequest` when the update is inconsistent with
    /// this schema or the merged result breaks a structural rule.
    pub fn update_and_validate(
        &self,
        update: &SchemaSpecificationUpdate,
    ) -> Result<Self, SchemaError> {
        let previous = self.spec();
        check_update(previous, update)?;

        let candidate = merge_update(previous, update)?;
        if candidate.same_content(previous) {
            debug!(version = previous.version, "schema update changed nothing");
            return Ok(self.clone());
        }

        validate_specification(&candidate)?;
        debug!(
            previous = previous.version,
            version = candidate.version,
            entity_types = candidate.entity_types.len(),
            component_types = candidate.component_types.len(),
            "schema update accepted"
        );
        Ok(Self::from_validated(candidate))
    }

    /// Re-run validation on the wrapped specification.
    ///
    /// # Errors
    ///
    /// Returns the first structural violation found.
    pub fn validate(&self) -> Result<(), SchemaError> {
        validate_specification(self.spec())
    }

    #[must_use]
    pub fn spec(&self) -> &SchemaSpecification {
        &self.inner.spec
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.inner.spec.version
    }

    #[must_use]
    pub fn entity_type(&self, name: &str) -> Option<&EntityTypeSpecification> {
        self.inner.spec.entity_type(name)
    }

    #[must_use]
    pub fn component_type(&self, name: &str) -> Option<&ComponentTypeSpecification> {
        self.inner.spec.component_type(name)
    }

    #[must_use]
    pub fn pattern(&self, name: &str) -> Option<&PatternSpecification> {
        self.inner.spec.pattern(name)
    }

    /// Compiled regex for a pattern, built on first use.
    #[must_use]
    pub fn pattern_regex(&self, name: &str) -> Option<&Regex> {
        self.inner
            .pattern_cache
            .regex(&self.inner.spec.patterns, name)
    }

    #[must_use]
    pub fn index(&self, name: &str) -> Option<&IndexSpecification> {
        self.inner.spec.index(name)
    }

    /// The publishable projection, derived on first request.
    #[must_use]
    pub fn to_published_schema(&self) -> &PublishedSchema {
        self.inner.published.get_or_init(|| {
            PublishedSchema::new(PublishedSchemaSpecification::project(&self.inner.spec))
        })
    }
}

impl Default for AdminSchema {
    fn default() -> Self {
        Self::empty()
    }
}
