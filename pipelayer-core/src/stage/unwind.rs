//! `$unwind`

use bson::Document;
use tracing::trace;

use crate::{
    context::ResolutionContext,
    error::AggregationResult,
    property::FieldPath,
    stage::{Stage, stage_document},
};

/// Builder for an `$unwind` stage.
///
/// An unwind without a path is omitted from the pipeline.
#[derive(Debug, Clone, Default)]
pub struct UnwindStage {
    path: Option<FieldPath>,
    include_array_index: Option<FieldPath>,
    preserve_null_and_empty_arrays: bool,
}

impl UnwindStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The array field to deconstruct.
    pub fn path(&mut self, path: impl Into<FieldPath>) -> &mut Self {
        self.path = Some(path.into());
        self
    }

    /// Names the field receiving the array index of each element.
    pub fn include_array_index(&mut self, field: impl Into<FieldPath>) -> &mut Self {
        self.include_array_index = Some(field.into());
        self
    }

    /// Emits a document for missing, null and empty arrays instead of dropping it.
    pub fn preserve_null_and_empty_arrays(&mut self, preserve: bool) -> &mut Self {
        self.preserve_null_and_empty_arrays = preserve;
        self
    }
}

impl Stage for UnwindStage {
    fn name(&self) -> &'static str {
        "$unwind"
    }

    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        let Some(path) = &self.path else {
            trace!("skipping $unwind declared without a path");
            return Ok(None);
        };

        let mut body = Document::new();
        body.insert("path", path.resolve_reference(ctx)?);
        if let Some(field) = &self.include_array_index {
            body.insert("includeArrayIndex", field.resolve(ctx)?);
        }
        body.insert("preserveNullAndEmptyArrays", self.preserve_null_and_empty_arrays);

        Ok(Some(stage_document(self.name(), body)))
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn resolve(stage: &UnwindStage) -> Option<Document> {
        stage.resolve(&ResolutionContext::default()).unwrap()
    }

    #[test]
    fn no_path_no_stage() {
        let mut stage = UnwindStage::new();
        stage.include_array_index("idx");

        assert_eq!(resolve(&stage), None);
    }

    #[test]
    fn preserve_defaults_to_false() {
        let mut stage = UnwindStage::new();
        stage.path("arr");
        assert_eq!(
            resolve(&stage),
            Some(doc! { "$unwind": { "path": "$arr", "preserveNullAndEmptyArrays": false } })
        );

        stage.preserve_null_and_empty_arrays(true);
        assert_eq!(
            resolve(&stage),
            Some(doc! { "$unwind": { "path": "$arr", "preserveNullAndEmptyArrays": true } })
        );
    }

    #[test]
    fn array_index_field() {
        let mut stage = UnwindStage::new();
        stage.path("sizes").include_array_index("arrayIndex");

        assert_eq!(
            resolve(&stage),
            Some(doc! {
                "$unwind": {
                    "path": "$sizes",
                    "includeArrayIndex": "arrayIndex",
                    "preserveNullAndEmptyArrays": false,
                }
            })
        );
    }
}
