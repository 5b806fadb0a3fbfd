//! `$project`

use bson::{Bson, Document};

use crate::{
    context::ResolutionContext,
    error::{AggregationError, AggregationResult},
    expression::{Expression, Expressions},
    operand::Operand,
    property::{FieldPath, IDENTITY_FIELD},
    stage::{Stage, stage_document},
};

#[derive(Debug, Clone)]
enum Projection {
    Include(FieldPath),
    Exclude(FieldPath),
    Computed(FieldPath, Operand),
}

/// Builder for a `$project` stage. Output keys follow declaration order.
#[derive(Debug, Clone, Default)]
pub struct ProjectStage {
    projections: Vec<Projection>,
}

impl ProjectStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Includes `field` in the output (`field: 1`).
    pub fn include(&mut self, field: impl Into<FieldPath>) -> &mut Self {
        self.projections.push(Projection::Include(field.into()));
        self
    }

    /// Excludes `field` from the output (`field: 0`).
    pub fn exclude(&mut self, field: impl Into<FieldPath>) -> &mut Self {
        self.projections.push(Projection::Exclude(field.into()));
        self
    }

    /// Suppresses the identity field, which is otherwise always projected.
    pub fn exclude_id(&mut self) -> &mut Self {
        self.exclude(IDENTITY_FIELD)
    }

    /// Projects `source`, a field, property or sub-expression, under the output name `name`.
    ///
    /// Literal sources are wrapped in `$literal` so they are never read as inclusion flags.
    pub fn alias(&mut self, source: impl Into<Operand>, name: impl Into<FieldPath>) -> &mut Self {
        let source = match source.into() {
            Operand::Literal(value) => Operand::from(Expressions::new().literal(value)),
            other => other,
        };
        self.projections.push(Projection::Computed(name.into(), source));
        self
    }

    /// Projects the expression built by `build` under the output name `name`.
    pub fn expression<R: Into<Expression>>(
        &mut self,
        name: impl Into<FieldPath>,
        build: impl FnOnce(&Expressions) -> R,
    ) -> &mut Self {
        let expression: Expression = build(&Expressions::new()).into();
        self.alias(expression, name)
    }

    /// Projects a constant under the output name `name`, wrapped in `$literal` so numbers and
    /// booleans are not read as inclusion flags.
    pub fn literal(&mut self, name: impl Into<FieldPath>, value: impl Into<Bson>) -> &mut Self {
        let value = value.into();
        self.expression(name, |e| e.literal(value))
    }
}

impl Stage for ProjectStage {
    fn name(&self) -> &'static str {
        "$project"
    }

    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        if self.projections.is_empty() {
            return Err(AggregationError::incomplete_stage(
                "$project",
                "at least one field must be included, excluded or computed",
            ));
        }

        let mut body = Document::new();
        for projection in &self.projections {
            match projection {
                Projection::Include(field) => body.insert(field.resolve(ctx)?, 1),
                Projection::Exclude(field) => body.insert(field.resolve(ctx)?, 0),
                Projection::Computed(name, operand) => body.insert(name.resolve(ctx)?, operand.resolve(ctx)?),
            };
        }

        Ok(Some(stage_document(self.name(), body)))
    }
}
