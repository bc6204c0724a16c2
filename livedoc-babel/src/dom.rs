//! rcdom tree helpers
//!
//! Parsing, node construction, lookups and local splices over a `markup5ever_rcdom` tree.
//! Nodes built here always get their parent link set when attached, so later lookups through
//! [`parent`] work the same for parsed and for synthesized nodes.

use crate::error::FormatError;
use html5ever::tendril::TendrilSink;
use html5ever::{
    ns, serialize, serialize::SerializeOpts, serialize::TraversalScope, Attribute, LocalName,
    QualName,
};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use std::cell::{Cell, RefCell};
use std::default::Default;
use std::rc::Rc;

/// Parse a complete HTML document. The parser repairs missing `html`, `head` and `body`.
pub fn parse_document(html: &str) -> RcDom {
    html5ever::parse_document(RcDom::default(), Default::default()).one(html)
}

/// Create an element node with the given attributes
pub fn create_element(tag: &str, attrs: Vec<(&str, &str)>) -> Handle {
    let qual_name = QualName::new(None, ns!(html), LocalName::from(tag));
    let attributes = attrs
        .into_iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.to_string().into(),
        })
        .collect();

    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Element {
            name: qual_name,
            attrs: RefCell::new(attributes),
            template_contents: Default::default(),
            mathml_annotation_xml_integration_point: false,
        },
    })
}

/// Create a text node
pub fn create_text(text: &str) -> Handle {
    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Text {
            contents: RefCell::new(text.to_string().into()),
        },
    })
}

/// Element with a single text child
pub fn text_element(tag: &str, attrs: Vec<(&str, &str)>, text: &str) -> Handle {
    let element = create_element(tag, attrs);
    append(&element, create_text(text));
    element
}

pub fn is_element(node: &Handle, tag: &str) -> bool {
    match &node.data {
        NodeData::Element { name, .. } => &*name.local == tag,
        _ => false,
    }
}

pub fn attribute(node: &Handle, key: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == key)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// Snapshot of the node's children.
pub fn children(node: &Handle) -> Vec<Handle> {
    node.children.borrow().clone()
}

/// Direct children that are `tag` elements.
pub fn child_elements(node: &Handle, tag: &str) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|child| is_element(child, tag))
        .cloned()
        .collect()
}

/// Every node below `node`, in document order.
pub fn descendants(node: &Handle) -> Vec<Handle> {
    let mut found = Vec::new();
    let mut stack: Vec<Handle> = node.children.borrow().iter().rev().cloned().collect();
    while let Some(current) = stack.pop() {
        stack.extend(current.children.borrow().iter().rev().cloned());
        found.push(current);
    }
    found
}

/// First `tag` element below `node`, in document order.
pub fn find_first(node: &Handle, tag: &str) -> Option<Handle> {
    descendants(node)
        .into_iter()
        .find(|candidate| is_element(candidate, tag))
}

/// Concatenated text of every text node below `node`.
pub fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    if let NodeData::Text { contents } = &node.data {
        text.push_str(&contents.borrow());
    }
    for descendant in descendants(node) {
        if let NodeData::Text { contents } = &descendant.data {
            text.push_str(&contents.borrow());
        }
    }
    text
}

pub fn parent(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take()?;
    let parent = weak.upgrade();
    node.parent.set(Some(weak));
    parent
}

pub fn append(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// Attach `child` before every existing child of `parent`.
pub fn prepend(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().insert(0, child);
}

/// Put `replacements` where `node` was. A detached node is left alone.
pub fn replace(node: &Handle, replacements: Vec<Handle>) {
    let Some(parent) = parent(node) else {
        return;
    };
    let index = parent
        .children
        .borrow()
        .iter()
        .position(|child| Rc::ptr_eq(child, node));
    if let Some(index) = index {
        for replacement in &replacements {
            replacement.parent.set(Some(Rc::downgrade(&parent)));
        }
        parent
            .children
            .borrow_mut()
            .splice(index..=index, replacements);
        node.parent.set(None);
    }
}

/// Detach and return every child of `node`.
pub fn take_children(node: &Handle) -> Vec<Handle> {
    let taken = std::mem::take(&mut *node.children.borrow_mut());
    for child in &taken {
        child.parent.set(None);
    }
    taken
}

/// Replace the children of `node`.
pub fn set_children(node: &Handle, children: Vec<Handle>) {
    take_children(node);
    for child in children {
        append(node, child);
    }
}

/// Detached copy of `node` and its subtree.
pub fn deep_clone(node: &Handle) -> Handle {
    let copy = match &node.data {
        NodeData::Element { name, attrs, .. } => Rc::new(Node {
            parent: Cell::new(None),
            children: RefCell::new(Vec::new()),
            data: NodeData::Element {
                name: name.clone(),
                attrs: RefCell::new(attrs.borrow().clone()),
                template_contents: Default::default(),
                mathml_annotation_xml_integration_point: false,
            },
        }),
        NodeData::Text { contents } => create_text(&contents.borrow()),
        NodeData::Comment { contents } => Rc::new(Node {
            parent: Cell::new(None),
            children: RefCell::new(Vec::new()),
            data: NodeData::Comment {
                contents: contents.clone(),
            },
        }),
        _ => create_text(""),
    };
    for child in node.children.borrow().iter() {
        append(&copy, deep_clone(child));
    }
    copy
}

/// Serialize `node` itself, markup included.
pub fn serialize_node(node: &Handle) -> Result<String, FormatError> {
    let mut output = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    let serializable = SerializableHandle::from(node.clone());
    serialize(&mut output, &serializable, opts).map_err(|e| {
        FormatError::SerializationError(format!("HTML serialization failed: {}", e))
    })?;
    String::from_utf8(output)
        .map_err(|e| FormatError::SerializationError(format!("UTF-8 conversion failed: {}", e)))
}

/// Serialize the children of `node`, without the node's own tags.
pub fn serialize_children(node: &Handle) -> Result<String, FormatError> {
    let mut html = String::new();
    for child in node.children.borrow().iter() {
        html.push_str(&serialize_node(child)?);
    }
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(html: &str) -> Handle {
        let dom = parse_document(html);
        let body = find_first(&dom.document, "body").unwrap();
        // Dropping the RcDom empties every descendant's children, so keep it alive.
        std::mem::forget(dom);
        body
    }

    #[test]
    fn test_parse_repairs_fragment() {
        let dom = parse_document("<p>hello</p>");
        assert!(find_first(&dom.document, "head").is_some());
        let body = find_first(&dom.document, "body").unwrap();
        assert_eq!(serialize_children(&body).unwrap(), "<p>hello</p>");
    }

    #[test]
    fn test_descendants_in_document_order() {
        let body = body("<p><a href=\"-\" title=\"a\">1</a><b><a href=\"-\" title=\"b\"></a></b></p><a href=\"-\" title=\"c\"></a>");
        let titles: Vec<String> = descendants(&body)
            .iter()
            .filter(|node| is_element(node, "a"))
            .filter_map(|node| attribute(node, "title"))
            .collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_text_content_concatenates() {
        let body = body("<p>one <b>two</b> three</p>");
        assert_eq!(text_content(&body), "one two three");
    }

    #[test]
    fn test_replace_splices_in_place() {
        let body = body("<p>a<i>b</i>c</p>");
        let italic = find_first(&body, "i").unwrap();
        replace(
            &italic,
            vec![
                text_element("span", vec![("class", "x")], "1 < 2"),
                create_text("!"),
            ],
        );
        assert_eq!(
            serialize_children(&body).unwrap(),
            "<p>a<span class=\"x\">1 &lt; 2</span>!c</p>"
        );
        assert!(parent(&italic).is_none());
    }

    #[test]
    fn test_prepend_keeps_existing_children() {
        let body = body("<h2>Price <code>x</code></h2>");
        let heading = find_first(&body, "h2").unwrap();
        prepend(&heading, text_element("b", vec![], "!"));
        assert_eq!(
            serialize_children(&body).unwrap(),
            "<h2><b>!</b>Price <code>x</code></h2>"
        );
        let first = children(&heading).into_iter().next().unwrap();
        assert!(Rc::ptr_eq(&parent(&first).unwrap(), &heading));
    }

    #[test]
    fn test_deep_clone_is_detached() {
        let body = body("<p><a href=\"-\" title=\"a=TEXT\">x</a></p>");
        let link = find_first(&body, "a").unwrap();
        let copy = deep_clone(&link);
        set_children(&copy, vec![create_text("5")]);
        assert!(parent(&copy).is_none());
        assert_eq!(
            serialize_node(&copy).unwrap(),
            "<a href=\"-\" title=\"a=TEXT\">5</a>"
        );
        assert_eq!(text_content(&link), "x");
    }
}
