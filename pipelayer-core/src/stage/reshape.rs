//! Stages replacing or trimming the whole document: `$unset`, `$replaceRoot`,
//! `$replaceWith` and `$documents`.

use bson::{Bson, Document, doc};

use crate::{
    context::ResolutionContext,
    error::{AggregationError, AggregationResult},
    operand::Operand,
    property::FieldPath,
    stage::{Stage, stage_document},
};

/// `$unset`: a single field resolves to a string, several to an array.
#[derive(Debug, Clone)]
pub struct UnsetStage(Vec<FieldPath>);

impl UnsetStage {
    pub fn new<F: Into<FieldPath>>(fields: impl IntoIterator<Item = F>) -> Self {
        UnsetStage(fields.into_iter().map(Into::into).collect())
    }
}

impl Stage for UnsetStage {
    fn name(&self) -> &'static str {
        "$unset"
    }

    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        let mut fields = self
            .0
            .iter()
            .map(|field| field.resolve(ctx))
            .collect::<AggregationResult<Vec<_>>>()?;

        let body = match fields.len() {
            0 => return Err(AggregationError::incomplete_stage("$unset", "at least one field is required")),
            1 => Bson::String(fields.remove(0)),
            _ => Bson::from(fields),
        };

        Ok(Some(stage_document(self.name(), body)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootForm {
    ReplaceRoot,
    ReplaceWith,
}

/// `$replaceRoot` and its shorthand `$replaceWith`.
#[derive(Debug, Clone)]
pub struct ReplaceRootStage {
    form: RootForm,
    root: Operand,
}

impl ReplaceRootStage {
    /// `{ $replaceRoot: { newRoot: root } }`
    pub fn replace_root(root: impl Into<Operand>) -> Self {
        Self { form: RootForm::ReplaceRoot, root: root.into() }
    }

    /// `{ $replaceWith: root }`
    pub fn replace_with(root: impl Into<Operand>) -> Self {
        Self { form: RootForm::ReplaceWith, root: root.into() }
    }
}

impl Stage for ReplaceRootStage {
    fn name(&self) -> &'static str {
        match self.form {
            RootForm::ReplaceRoot => "$replaceRoot",
            RootForm::ReplaceWith => "$replaceWith",
        }
    }

    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        let root = self.root.resolve(ctx)?;

        Ok(Some(match self.form {
            RootForm::ReplaceRoot => stage_document(self.name(), doc! { "newRoot": root }),
            RootForm::ReplaceWith => stage_document(self.name(), root),
        }))
    }
}

/// `$documents`: literal input documents, valid as the first stage of a pipeline.
#[derive(Debug, Clone, Default)]
pub struct DocumentsStage(Vec<Document>);

impl DocumentsStage {
    pub fn new(documents: impl IntoIterator<Item = Document>) -> Self {
        DocumentsStage(documents.into_iter().collect())
    }
}

impl Stage for DocumentsStage {
    fn name(&self) -> &'static str {
        "$documents"
    }

    fn resolve(&self, _ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        Ok(Some(stage_document(self.name(), self.0.clone())))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::property::Property;

    fn resolve(stage: &dyn Stage) -> AggregationResult<Option<Document>> {
        stage.resolve(&ResolutionContext::default())
    }

    #[test]
    fn unset_one_or_many() {
        assert_eq!(
            resolve(&UnsetStage::new(["copies"])).unwrap(),
            Some(doc! { "$unset": "copies" })
        );
        assert_eq!(
            resolve(&UnsetStage::new([
                FieldPath::from("isbn"),
                FieldPath::from(Property::new("author").nested(Property::new("first"))),
            ]))
            .unwrap(),
            Some(doc! { "$unset": ["isbn", "author.first"] })
        );
        assert!(resolve(&UnsetStage::new(Vec::<String>::new())).is_err());
    }

    #[test]
    fn replace_root_and_with() {
        assert_eq!(
            resolve(&ReplaceRootStage::replace_root("name")).unwrap(),
            Some(doc! { "$replaceRoot": { "newRoot": "$name" } })
        );
        assert_eq!(
            resolve(&ReplaceRootStage::replace_with(Operand::expression(|e| {
                e.if_null(|n| n.case("details").then_value(doc! {}))
            })))
            .unwrap(),
            Some(doc! { "$replaceWith": { "$ifNull": ["$details", {}] } })
        );
        assert_eq!(ReplaceRootStage::replace_root("name").name(), "$replaceRoot");
        assert_eq!(ReplaceRootStage::replace_with("name").name(), "$replaceWith");
    }

    #[test]
    fn literal_documents() {
        assert_eq!(
            resolve(&DocumentsStage::new([doc! { "x": 10 }, doc! { "x": 2 }])).unwrap(),
            Some(doc! { "$documents": [{ "x": 10 }, { "x": 2 }] })
        );
    }
}
