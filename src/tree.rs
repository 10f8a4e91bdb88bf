//! Generic hierarchical tree consumed by the binding passes.
//!
//! [`Tree`] is the narrow surface records need: select children by path, read a
//! node's text, put text at a path, append a child. [`PropertyTree`] is the
//! in-memory implementation the XML and JSON adapters produce: an ordered
//! multimap where sibling names may repeat.

/// Default separator between path segments in field names.
pub const DEFAULT_DELIMITER: char = '/';

/// Conventional sub-key holding XML attributes (`<xmlattr>/name`).
pub const XML_ATTRIBUTES: &str = "<xmlattr>";

pub trait Tree {
    /// All children matching `path` below this node.
    ///
    /// Intermediate segments follow the first matching child, the last segment
    /// selects every matching sibling. An empty path selects this node.
    fn children_at<'a>(&'a self, path: &str, delimiter: char) -> Vec<&'a dyn Tree>;

    /// Text held by this node.
    fn value(&self) -> &str;

    /// Sets the text at `path`, creating missing nodes and overwriting an existing one.
    fn put_value(&mut self, path: &str, delimiter: char, value: String);

    /// Appends a new empty child at `path` and returns it.
    fn add_child(&mut self, path: &str, delimiter: char) -> &mut dyn Tree;

    /// Whether this is the synthetic root wrapping a document's top element.
    fn is_document_root(&self) -> bool {
        false
    }

    /// The top element of a document root.
    fn document_element(&self) -> Option<&dyn Tree> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyTree {
    data: String,
    children: Vec<(String, PropertyTree)>,
    document: bool,
}

fn segments(path: &str, delimiter: char) -> impl Iterator<Item = &str> {
    path.split(delimiter).filter(|segment| !segment.is_empty())
}

impl PropertyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: impl Into<String>) -> Self {
        Self { data: data.into(), ..Self::default() }
    }

    /// An empty synthetic document root.
    pub fn document() -> Self {
        Self { document: true, ..Self::default() }
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn set_data(&mut self, data: impl Into<String>) {
        self.data = data.into();
    }

    pub fn is_document(&self) -> bool {
        self.document
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &PropertyTree)> {
        self.children.iter().map(|(name, child)| (name.as_str(), child))
    }

    /// Appends `child` under `name`, keeping any existing siblings of that name.
    pub fn push_child(&mut self, name: impl Into<String>, child: PropertyTree) -> &mut PropertyTree {
        let index = self.children.len();
        self.children.push((name.into(), child));
        &mut self.children[index].1
    }

    /// First node at `path` (separated by [`DEFAULT_DELIMITER`]).
    pub fn get_child(&self, path: &str) -> Option<&PropertyTree> {
        self.select(path, DEFAULT_DELIMITER).into_iter().next()
    }

    pub fn count(&self, name: &str) -> usize {
        self.children.iter().filter(|(key, _)| key == name).count()
    }

    /// Concrete counterpart of [`Tree::children_at`].
    pub fn select(&self, path: &str, delimiter: char) -> Vec<&PropertyTree> {
        let path: Vec<&str> = segments(path, delimiter).collect();
        let Some((last, parents)) = path.split_last() else {
            return vec![self];
        };
        let mut node = self;
        for segment in parents {
            match node.children.iter().find(|(key, _)| key == segment) {
                Some((_, child)) => node = child,
                None => return Vec::new(),
            }
        }
        node.children
            .iter()
            .filter(|(key, _)| key == last)
            .map(|(_, child)| child)
            .collect()
    }

    fn child_or_insert(&mut self, name: &str) -> &mut PropertyTree {
        let index = match self.children.iter().position(|(key, _)| key == name) {
            Some(index) => index,
            None => {
                self.children.push((name.to_string(), PropertyTree::new()));
                self.children.len() - 1
            }
        };
        &mut self.children[index].1
    }
}

impl Tree for PropertyTree {
    fn children_at<'a>(&'a self, path: &str, delimiter: char) -> Vec<&'a dyn Tree> {
        self.select(path, delimiter)
            .into_iter()
            .map(|child| child as &dyn Tree)
            .collect()
    }

    fn value(&self) -> &str {
        &self.data
    }

    fn put_value(&mut self, path: &str, delimiter: char, value: String) {
        let mut node = self;
        for segment in segments(path, delimiter) {
            node = node.child_or_insert(segment);
        }
        node.data = value;
    }

    fn add_child(&mut self, path: &str, delimiter: char) -> &mut dyn Tree {
        let path: Vec<&str> = segments(path, delimiter).collect();
        let Some((last, parents)) = path.split_last() else {
            return self;
        };
        let mut node = self;
        for segment in parents {
            node = node.child_or_insert(segment);
        }
        node.push_child(*last, PropertyTree::new())
    }

    fn is_document_root(&self) -> bool {
        self.document
    }

    fn document_element(&self) -> Option<&dyn Tree> {
        if !self.document {
            return None;
        }
        self.children.last().map(|(_, child)| child as &dyn Tree)
    }
}
