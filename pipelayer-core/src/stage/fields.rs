//! `$addFields` and `$set`

use bson::{Bson, Document};

use crate::{
    context::ResolutionContext,
    error::{AggregationError, AggregationResult},
    expression::{Expression, Expressions},
    operand::Operand,
    property::FieldPath,
    stage::{Stage, stage_document},
};

/// Builder shared by `$addFields` and its alias `$set`.
///
/// Assigning the same field twice keeps the first position and the last value.
#[derive(Debug, Clone)]
pub struct FieldAssignmentStage {
    name: &'static str,
    assignments: Vec<(FieldPath, Operand)>,
}

impl FieldAssignmentStage {
    /// Creates an `$addFields` builder.
    pub fn add_fields() -> Self {
        Self { name: "$addFields", assignments: Vec::new() }
    }

    /// Creates a `$set` builder.
    pub fn set_fields() -> Self {
        Self { name: "$set", assignments: Vec::new() }
    }

    /// Assigns `value`, a literal, field, property or sub-expression, to `field`.
    ///
    /// Strings are field references; use [`set_value`](Self::set_value) for string constants.
    pub fn set(&mut self, field: impl Into<FieldPath>, value: impl Into<Operand>) -> &mut Self {
        self.assignments.push((field.into(), value.into()));
        self
    }

    /// Assigns a constant to `field`.
    pub fn set_value(&mut self, field: impl Into<FieldPath>, value: impl Into<Bson>) -> &mut Self {
        self.set(field, Operand::literal(value))
    }

    /// Copies the value of `source` into `field`.
    pub fn set_by_field(&mut self, field: impl Into<FieldPath>, source: impl Into<FieldPath>) -> &mut Self {
        let source: FieldPath = source.into();
        self.set(field, source)
    }

    /// Assigns the expression built by `build` to `field`.
    pub fn set_expression<R: Into<Expression>>(
        &mut self,
        field: impl Into<FieldPath>,
        build: impl FnOnce(&Expressions) -> R,
    ) -> &mut Self {
        let expression: Expression = build(&Expressions::new()).into();
        self.set(field, expression)
    }
}

impl Stage for FieldAssignmentStage {
    fn name(&self) -> &'static str {
        self.name
    }

    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        if self.assignments.is_empty() {
            return Err(AggregationError::incomplete_stage(
                self.name,
                "at least one field assignment is required",
            ));
        }

        let mut body = Document::new();
        for (field, value) in &self.assignments {
            body.insert(field.resolve(ctx)?, value.resolve(ctx)?);
        }

        Ok(Some(stage_document(self.name, body)))
    }
}
