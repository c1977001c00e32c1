//! Tag-keyed add/remove field operations applied after a successful match
//! (spec.md §3 "Annotation set", §4.E "Annotation pipeline").
//!
//! Grounded in `annot.c`: `ln_loadAnnotate` appends operations onto an
//! existing tag's list rather than replacing it (`ln_combineAnnot`), and
//! `ln_annotate` walks a match's tag list applying each tag's operations in
//! declaration order, ADD unconditionally overwriting and REMOVE being a
//! no-op when the field is already absent.

use crate::value::{Fields, Value};
use std::collections::HashMap;

/// One annotation operation (spec.md §3 "Combining rule").
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotOp {
    Add { name: String, value: String },
    Remove { name: String },
}

/// Ordered operations attached to one tag.
#[derive(Debug, Clone, Default)]
pub struct Annotation {
    pub ops: Vec<AnnotOp>,
}

/// Mapping from tag string to its [`Annotation`] (spec.md §3). Loading the
/// same tag twice concatenates operation lists, existing ops first
/// (spec.md §4.C "Combining rule").
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    by_tag: HashMap<String, Annotation>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        AnnotationSet { by_tag: HashMap::new() }
    }

    /// Appends `ops` onto whatever operations the tag already carries.
    pub fn extend(&mut self, tag: impl Into<String>, ops: Vec<AnnotOp>) {
        self.by_tag.entry(tag.into()).or_default().ops.extend(ops);
    }

    pub fn get(&self, tag: &str) -> Option<&Annotation> {
        self.by_tag.get(tag)
    }

    /// Applies every tag's operations, in the order the tags appear in
    /// `tags`, to `fields` (spec.md §4.E). A tag with no annotation is not
    /// an error — it is simply skipped.
    pub fn apply(&self, tags: &[String], fields: &mut Fields) {
        for tag in tags {
            let Some(annotation) = self.by_tag.get(tag) else { continue };
            for op in &annotation.ops {
                match op {
                    AnnotOp::Add { name, value } => fields.insert(name.clone(), Value::str(value.clone())),
                    AnnotOp::Remove { name } => {
                        fields.remove(name);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_load_concatenates_existing_first() {
        let mut set = AnnotationSet::new();
        set.extend("login", vec![AnnotOp::Add { name: "a".into(), value: "1".into() }]);
        set.extend("login", vec![AnnotOp::Add { name: "b".into(), value: "2".into() }]);
        let ops = &set.get("login").unwrap().ops;
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0], AnnotOp::Add { name: "a".into(), value: "1".into() });
    }

    #[test]
    fn add_is_idempotent_across_duplicate_tags() {
        let mut set = AnnotationSet::new();
        set.extend("t", vec![AnnotOp::Add { name: "origin".into(), value: "syslog".into() }]);
        let mut fields = Fields::new();
        set.apply(&["t".to_string(), "t".to_string()], &mut fields);
        assert_eq!(fields.get("origin"), Some(&Value::str("syslog")));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut set = AnnotationSet::new();
        set.extend("t", vec![AnnotOp::Remove { name: "x".into() }]);
        let mut fields = Fields::new();
        fields.insert("x", Value::str("1"));
        set.apply(&["t".to_string(), "t".to_string()], &mut fields);
        assert!(!fields.contains("x"));
    }

    #[test]
    fn unannotated_tag_is_not_an_error() {
        let set = AnnotationSet::new();
        let mut fields = Fields::new();
        set.apply(&["no-such-tag".to_string()], &mut fields);
        assert!(fields.is_empty());
    }
}
