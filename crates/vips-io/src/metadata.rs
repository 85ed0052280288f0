//! Restoring history and typed metadata from the extension block.
//!
//! [`read_and_reconcile`] is the only writer of [`ImageMetadata`]. The state
//! it produces is derived entirely from the file: any previously attached
//! document is discarded first, so calling it again after the file changed
//! brings the handle back in sync.

use crate::attrs::{Attrs, TypeRegistry};
use crate::extension::read_extension;
use crate::header::Header;
use crate::meta::{MetaDocument, split_history};
use crate::{IoError, IoResult};
use std::fs::File;

/// History, typed fields and the parsed document of one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMetadata {
    pub(crate) history: Vec<String>,
    pub(crate) attrs: Attrs,
    pub(crate) document: Option<MetaDocument>,
}

impl ImageMetadata {
    /// Processing history, one entry per line.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Typed metadata fields.
    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// The attached XML document, if the file carried a valid one.
    pub fn document(&self) -> Option<&MetaDocument> {
        self.document.as_ref()
    }

    fn reset(&mut self) {
        self.history.clear();
        self.attrs.clear();
        self.document = None;
    }
}

/// Reads the extension block of `file` and rebuilds `metadata` from it.
///
/// With no extension block the metadata ends up empty and this succeeds.
/// Otherwise the block is parsed and namespace-checked, attached, and then
/// applied: every `Hist` header field replaces the history, and every typed
/// `meta` field is converted through `registry`. Fields of unknown type are
/// skipped. The first field whose text fails to convert stops the pass with
/// [`IoError::MetadataTransform`]; fields applied before it stay.
pub fn read_and_reconcile(
    metadata: &mut ImageMetadata,
    header: &Header,
    file: &mut File,
    registry: &TypeRegistry,
) -> IoResult<()> {
    metadata.reset();

    let Some(block) = read_extension(header, file)? else {
        return Ok(());
    };

    metadata.document = Some(MetaDocument::parse(block.as_bytes())?);
    apply_document(metadata, registry)
}

fn apply_document(metadata: &mut ImageMetadata, registry: &TypeRegistry) -> IoResult<()> {
    let ImageMetadata {
        history,
        attrs,
        document,
    } = metadata;
    let Some(doc) = document.as_ref() else {
        return Ok(());
    };

    for text in doc.history_texts() {
        *history = split_history(&text);
    }

    for field in doc.meta_fields() {
        match registry.transform(field.type_name, &field.node.text_content()) {
            None => {
                tracing::debug!(
                    "skipping field \"{}\": type {} is not transformable",
                    field.name,
                    field.type_name
                );
            }
            Some(Ok(value)) => attrs.set(field.name, value),
            Some(Err(reason)) => {
                return Err(IoError::MetadataTransform {
                    name: field.name.to_string(),
                    type_name: field.type_name.to_string(),
                    reason,
                });
            }
        }
    }

    Ok(())
}
