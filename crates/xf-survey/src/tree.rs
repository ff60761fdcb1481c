use std::cell::RefCell;
use std::collections::HashMap;

use xf_core::{FieldValue, TypeDefaults, ALL_ANNOTATED_FIELDS, REPEAT};

use crate::element::Element;

/// Index into the tree's element arena. Stable for the lifetime of the
/// tree, which makes it a usable memoization key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq)]
pub struct SurveyOptions {
    pub default_language: String,
    pub annotated_fields: Vec<String>,
}

impl Default for SurveyOptions {
    fn default() -> Self {
        Self {
            default_language: "default".to_string(),
            annotated_fields: Vec::new(),
        }
    }
}

impl SurveyOptions {
    pub fn annotated(fields: &[&str]) -> Self {
        Self {
            annotated_fields: fields.iter().map(|field| (*field).to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn is_annotated_form(&self) -> bool {
        !self.annotated_fields.is_empty()
    }

    /// The configured annotation fields with the "all" sentinel expanded to
    /// the canonical ordered list.
    pub fn expanded_annotated_fields(&self) -> Vec<String> {
        if self.annotated_fields.iter().any(|field| field == "all") {
            ALL_ANNOTATED_FIELDS
                .iter()
                .map(|field| (*field).to_string())
                .collect()
        } else {
            self.annotated_fields.clone()
        }
    }
}

/// Construction phase of a survey tree. Elements are registered root-first;
/// `add_child` links both directions. The caller must not introduce cycles
/// (children are fresh registrations, so none can occur through this API).
#[derive(Debug)]
pub struct TreeBuilder {
    elements: Vec<Element>,
    options: SurveyOptions,
    type_defaults: TypeDefaults,
}

impl TreeBuilder {
    pub fn new(options: SurveyOptions) -> Self {
        Self::with_type_defaults(options, TypeDefaults::builtin())
    }

    pub fn with_type_defaults(options: SurveyOptions, type_defaults: TypeDefaults) -> Self {
        Self {
            elements: Vec::new(),
            options,
            type_defaults,
        }
    }

    pub fn root(&mut self, element: Element) -> ElementId {
        self.register(element, None)
    }

    pub fn add_child(&mut self, parent: ElementId, element: Element) -> ElementId {
        let id = self.register(element, Some(parent));
        self.elements[parent.0].children.push(id);
        id
    }

    fn register(&mut self, mut element: Element, parent: Option<ElementId>) -> ElementId {
        // Unlabeled elements with the label appearance get a blank label so
        // they can caption select columns in a field-list.
        if element.label.is_empty() && self.control_appearance(&element) == "label" {
            element.label = FieldValue::text(" ");
        }
        element.parent = parent;
        element.children = Vec::new();
        self.elements.push(element);
        ElementId(self.elements.len() - 1)
    }

    fn control_appearance(&self, element: &Element) -> String {
        if let Some(appearance) = element.control.get("appearance") {
            return appearance.clone();
        }
        self.type_defaults
            .field_default(&element.typ, "control")
            .and_then(|control| control.as_map())
            .and_then(|control| control.get("appearance"))
            .map(|value| value.text_for_lang(None))
            .unwrap_or_default()
    }

    pub fn freeze(self) -> SurveyTree {
        log::debug!("freezing survey tree with {} elements", self.elements.len());
        SurveyTree {
            elements: self.elements,
            options: self.options,
            type_defaults: self.type_defaults,
            repeat_cache: RefCell::new(HashMap::new()),
        }
    }
}

/// A frozen survey tree. All generation passes are read-only traversals
/// over this structure; the repeat-lookup cache below is sound precisely
/// because no mutation is possible after `freeze`.
#[derive(Debug)]
pub struct SurveyTree {
    elements: Vec<Element>,
    options: SurveyOptions,
    type_defaults: TypeDefaults,
    repeat_cache: RefCell<HashMap<(usize, String), bool>>,
}

impl SurveyTree {
    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn options(&self) -> &SurveyOptions {
        &self.options
    }

    pub fn type_defaults(&self) -> &TypeDefaults {
        &self.type_defaults
    }

    pub fn get(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).parent
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self.get(id).children
    }

    /// Preorder traversal starting at (and including) `id`. Every call
    /// starts a fresh walk; the iterator borrows the tree immutably.
    pub fn descendants(&self, id: ElementId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// The ancestor chain `[root, ..., id]` with every flat node after the
    /// root removed from the path.
    pub fn lineage(&self, id: ElementId) -> Vec<ElementId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        let mut lineage = vec![chain[0]];
        lineage.extend(
            chain[1..]
                .iter()
                .copied()
                .filter(|entry| !self.get(*entry).flat),
        );
        lineage
    }

    pub fn xpath(&self, id: ElementId) -> String {
        let names: Vec<&str> = self
            .lineage(id)
            .iter()
            .map(|entry| self.get(*entry).name.as_str())
            .collect();
        format!("/{}", names.join("/"))
    }

    pub fn abbreviated_xpath(&self, id: ElementId) -> String {
        let lineage = self.lineage(id);
        if lineage.len() >= 2 {
            let names: Vec<&str> = lineage[1..]
                .iter()
                .map(|entry| self.get(*entry).name.as_str())
                .collect();
            names.join("/")
        } else {
            self.get(lineage[0]).name.clone()
        }
    }

    /// True when some descendant of `id` (itself included) is a repeat whose
    /// xpath equals `target_xpath`. Memoized per `(id, target_xpath)`; valid
    /// because the tree cannot change after `freeze`.
    pub fn any_repeat(&self, id: ElementId, target_xpath: &str) -> bool {
        let key = (id.0, target_xpath.to_string());
        if let Some(cached) = self.repeat_cache.borrow().get(&key) {
            return *cached;
        }
        let found = self.descendants(id).any(|entry| {
            self.get(entry).typ == REPEAT && self.xpath(entry) == target_xpath
        });
        self.repeat_cache.borrow_mut().insert(key, found);
        found
    }
}

pub struct Descendants<'a> {
    tree: &'a SurveyTree,
    stack: Vec<ElementId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = ElementId;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        for child in self.tree.children(next).iter().rev() {
            self.stack.push(*child);
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_tree() -> SurveyTree {
        let mut builder = TreeBuilder::new(SurveyOptions::default());
        let root = builder.root(Element::new("survey", "data"));
        let group = builder.add_child(root, Element::new("group", "demographics"));
        builder.add_child(group, Element::new("string", "name"));
        builder.add_child(group, Element::new("int", "age"));
        let repeat = builder.add_child(root, Element::new("repeat", "kids"));
        builder.add_child(repeat, Element::new("string", "kid_name"));
        builder.freeze()
    }

    #[test]
    fn add_child_links_both_directions() {
        let tree = fixture_tree();
        let root = tree.root();
        let group = tree.children(root)[0];
        assert_eq!(tree.parent(group), Some(root));
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.children(group).len(), 2);
    }

    #[test]
    fn descendants_walk_preorder_left_to_right() {
        let tree = fixture_tree();
        let names: Vec<String> = tree
            .descendants(tree.root())
            .map(|id| tree.get(id).name.clone())
            .collect();
        assert_eq!(
            names,
            vec!["data", "demographics", "name", "age", "kids", "kid_name"]
        );
    }

    #[test]
    fn descendants_restart_fresh_on_every_call() {
        let tree = fixture_tree();
        let first: Vec<ElementId> = tree.descendants(tree.root()).collect();
        let second: Vec<ElementId> = tree.descendants(tree.root()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn xpath_joins_lineage_names_from_the_root() {
        let tree = fixture_tree();
        let group = tree.children(tree.root())[0];
        let name = tree.children(group)[0];
        assert_eq!(tree.xpath(name), "/data/demographics/name");
        assert_eq!(tree.abbreviated_xpath(name), "demographics/name");
        assert_eq!(tree.abbreviated_xpath(tree.root()), "data");
    }

    #[test]
    fn flat_elements_drop_out_of_the_path() {
        let mut builder = TreeBuilder::new(SurveyOptions::default());
        let root = builder.root(Element::new("survey", "data"));
        let mut flat_group = Element::new("group", "wrapper");
        flat_group.flat = true;
        let wrapper = builder.add_child(root, flat_group);
        let question = builder.add_child(wrapper, Element::new("string", "name"));
        let tree = builder.freeze();
        assert_eq!(tree.xpath(question), "/data/name");
        assert_eq!(tree.lineage(question).len(), 2);
    }

    #[test]
    fn flat_root_is_always_kept_in_the_lineage() {
        let mut builder = TreeBuilder::new(SurveyOptions::default());
        let mut root_element = Element::new("survey", "data");
        root_element.flat = true;
        let root = builder.root(root_element);
        let question = builder.add_child(root, Element::new("string", "name"));
        let tree = builder.freeze();
        assert_eq!(tree.xpath(question), "/data/name");
    }

    #[test]
    fn any_repeat_matches_repeats_by_xpath_and_memoizes() {
        let tree = fixture_tree();
        assert!(tree.any_repeat(tree.root(), "/data/kids"));
        assert!(tree.any_repeat(tree.root(), "/data/kids"));
        assert!(!tree.any_repeat(tree.root(), "/data/demographics"));
        let group = tree.children(tree.root())[0];
        assert!(!tree.any_repeat(group, "/data/kids"));
    }

    #[test]
    fn label_appearance_elements_get_a_blank_label() {
        let mut builder = TreeBuilder::new(SurveyOptions::default());
        let root = builder.root(Element::new("survey", "data"));
        let mut labelled = Element::new("string", "header");
        labelled
            .control
            .insert("appearance".to_string(), "label".to_string());
        let id = builder.add_child(root, labelled);
        let tree = builder.freeze();
        assert_eq!(tree.get(id).label, FieldValue::text(" "));
    }

    #[test]
    fn expanded_annotated_fields_honours_the_all_sentinel() {
        let explicit = SurveyOptions::annotated(&["type", "name"]);
        assert_eq!(explicit.expanded_annotated_fields(), vec!["type", "name"]);
        let all = SurveyOptions::annotated(&["type", "all"]);
        assert_eq!(all.expanded_annotated_fields().len(), ALL_ANNOTATED_FIELDS.len());
        assert!(all.is_annotated_form());
        assert!(!SurveyOptions::default().is_annotated_form());
    }
}
