//! The pane/group tree.
//!
//! On disk the tree is flat: each node is one section, and a node's children follow it
//! between a scope-begin and a scope-end marker (`pas1`/`pae1` below panes,
//! `grs1`/`gre1` below groups). A node without children has no markers at all, so
//! whether a node has children is decided by looking one section ahead.
//!
//! Decoding recurses over a shared [`SectionStream`], which also carries the global
//! section budget from the file header. Encoding flattens the tree into [`Record`]s,
//! parents before children, which the orchestrator then writes and counts. Both
//! directions stop at [`MAX_TREE_DEPTH`] levels below the root.

use brlyt_common::BinaryWriter;
use tracing::{debug, warn};

use crate::panes::{Group, Pane, PaneProperties, Picture, Text, Window};
use crate::section::{write_header, Section, SectionHeader, SectionStream};
use crate::{Error, Result, SectionKind};

/// Deepest nesting of child lists below a root pane or group.
pub const MAX_TREE_DEPTH: usize = 256;

/// A node of the layout tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Node {
    Pane(Pane),
    Bounding(Pane),
    Picture(Picture),
    Text(Text),
    Window(Window),
    Group(Group),
}

impl Node {
    /// The section kind this node is stored as.
    pub fn kind(&self) -> SectionKind {
        match self {
            Node::Pane(_) => SectionKind::Pane,
            Node::Bounding(_) => SectionKind::Bounding,
            Node::Picture(_) => SectionKind::Picture,
            Node::Text(_) => SectionKind::Text,
            Node::Window(_) => SectionKind::Window,
            Node::Group(_) => SectionKind::Group,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Group(group) => &group.name,
            _ => self.properties().map_or("", |properties| &properties.name),
        }
    }

    /// Common pane fields; `None` for groups.
    pub fn properties(&self) -> Option<&PaneProperties> {
        match self {
            Node::Pane(pane) | Node::Bounding(pane) => Some(&pane.properties),
            Node::Picture(picture) => Some(&picture.properties),
            Node::Text(text) => Some(&text.properties),
            Node::Window(window) => Some(&window.properties),
            Node::Group(_) => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Pane(pane) | Node::Bounding(pane) => &pane.children,
            Node::Picture(picture) => &picture.children,
            Node::Text(text) => &text.children,
            Node::Window(window) => &window.children,
            Node::Group(group) => &group.children,
        }
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        match self {
            Node::Pane(pane) | Node::Bounding(pane) => &mut pane.children,
            Node::Picture(picture) => &mut picture.children,
            Node::Text(text) => &mut text.children,
            Node::Window(window) => &mut window.children,
            Node::Group(group) => &mut group.children,
        }
    }

    /// Number of nodes in this subtree, this one included.
    pub fn subtree_len(&self) -> usize {
        1 + self.children().iter().map(Node::subtree_len).sum::<usize>()
    }

    /// Decode a single node from its section. Returns `None` for kinds that are not
    /// tree nodes.
    fn decode(section: Section<'_>) -> Result<Option<Node>> {
        let payload = section.payload;
        let node = match section.kind() {
            SectionKind::Pane => Node::Pane(Pane::decode(payload)?),
            SectionKind::Bounding => Node::Bounding(Pane::decode(payload)?),
            SectionKind::Picture => Node::Picture(Picture::decode(payload)?),
            SectionKind::Text => Node::Text(Text::decode(payload)?),
            SectionKind::Window => Node::Window(Window::decode(payload)?),
            SectionKind::Group => Node::Group(Group::decode(payload)?),
            _ => return Ok(None),
        };
        Ok(Some(node))
    }
}

/// If the next section opens a child list, read the whole list into `children`.
///
/// `depth` is the depth of the node that owns the list, zero for a root.
pub(crate) fn read_children(
    stream: &mut SectionStream<'_>,
    children: &mut Vec<Node>,
    depth: usize,
) -> Result<()> {
    if stream.take_scope_start()? {
        if depth >= MAX_TREE_DEPTH {
            return Err(Error::TreeTooDeep {
                max: MAX_TREE_DEPTH,
            });
        }
        *children = collect_children(stream, depth + 1)?;
    }
    Ok(())
}

fn collect_children(stream: &mut SectionStream<'_>, depth: usize) -> Result<Vec<Node>> {
    let mut children = Vec::new();
    while let Some(section) = stream.next_section()? {
        if section.kind().is_scope_end() || section.payload.is_empty() {
            break;
        }
        match Node::decode(section)? {
            Some(mut node) => {
                debug!(depth, kind = %node.kind(), name = node.name(), "decoded node");
                read_children(stream, node.children_mut(), depth)?;
                children.push(node);
            }
            None => {
                warn!(
                    depth,
                    kind = %section.kind(),
                    size = section.header.size,
                    "skipping section inside a child list"
                );
            }
        }
    }
    Ok(children)
}

/// Which marker pair delimits a child list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Pane,
    Group,
}

impl Scope {
    fn markers(self) -> (SectionKind, SectionKind) {
        match self {
            Scope::Pane => (SectionKind::PaneStart, SectionKind::PaneEnd),
            Scope::Group => (SectionKind::GroupStart, SectionKind::GroupEnd),
        }
    }
}

/// One section of the flattened tree.
#[derive(Debug, Clone, Copy)]
pub enum Record<'a> {
    Pane(&'a Pane),
    Bounding(&'a Pane),
    Picture(&'a Picture),
    Text(&'a Text),
    Window(&'a Window),
    Group(&'a Group),
    ScopeBegin(Scope),
    ScopeEnd(Scope),
}

impl Record<'_> {
    pub fn kind(&self) -> SectionKind {
        match self {
            Record::Pane(_) => SectionKind::Pane,
            Record::Bounding(_) => SectionKind::Bounding,
            Record::Picture(_) => SectionKind::Picture,
            Record::Text(_) => SectionKind::Text,
            Record::Window(_) => SectionKind::Window,
            Record::Group(_) => SectionKind::Group,
            Record::ScopeBegin(scope) => scope.markers().0,
            Record::ScopeEnd(scope) => scope.markers().1,
        }
    }

    pub fn write(&self, writer: &mut BinaryWriter) -> Result<()> {
        match self {
            Record::Pane(pane) => pane.encode(SectionKind::Pane, writer),
            Record::Bounding(pane) => pane.encode(SectionKind::Bounding, writer),
            Record::Picture(picture) => picture.encode(writer),
            Record::Text(text) => text.encode(writer),
            Record::Window(window) => window.encode(writer),
            Record::Group(group) => group.encode(writer),
            Record::ScopeBegin(_) | Record::ScopeEnd(_) => {
                write_header(writer, self.kind(), SectionHeader::SIZE as u32);
                Ok(())
            }
        }
    }
}

impl<'a> From<&'a Node> for Record<'a> {
    fn from(node: &'a Node) -> Self {
        match node {
            Node::Pane(pane) => Record::Pane(pane),
            Node::Bounding(pane) => Record::Bounding(pane),
            Node::Picture(picture) => Record::Picture(picture),
            Node::Text(text) => Record::Text(text),
            Node::Window(window) => Record::Window(window),
            Node::Group(group) => Record::Group(group),
        }
    }
}

/// Append `children` wrapped in scope markers. An empty list adds nothing.
fn flatten_children<'a>(
    children: &'a [Node],
    scope: Scope,
    depth: usize,
    out: &mut Vec<Record<'a>>,
) -> Result<()> {
    if children.is_empty() {
        return Ok(());
    }
    if depth >= MAX_TREE_DEPTH {
        return Err(Error::TreeTooDeep {
            max: MAX_TREE_DEPTH,
        });
    }
    out.push(Record::ScopeBegin(scope));
    for child in children {
        out.push(Record::from(child));
        let child_scope = match child {
            Node::Group(_) => Scope::Group,
            _ => Scope::Pane,
        };
        flatten_children(child.children(), child_scope, depth + 1, out)?;
    }
    out.push(Record::ScopeEnd(scope));
    Ok(())
}

/// Flatten the root pane and optional root group into section order.
pub fn flatten<'a>(
    root_pane: &'a Pane,
    root_group: Option<&'a Group>,
) -> Result<Vec<Record<'a>>> {
    let mut records = vec![Record::Pane(root_pane)];
    flatten_children(&root_pane.children, Scope::Pane, 0, &mut records)?;
    if let Some(group) = root_group {
        records.push(Record::Group(group));
        flatten_children(&group.children, Scope::Group, 0, &mut records)?;
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brlyt_common::BinaryReader;

    fn pane(name: &str, children: Vec<Node>) -> Node {
        let mut pane = Pane::new(PaneProperties::new(name));
        pane.children = children;
        Node::Pane(pane)
    }

    fn write_records(records: &[Record<'_>]) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        for record in records {
            record.write(&mut writer).unwrap();
        }
        writer.into_inner()
    }

    fn decode_root(bytes: &[u8], count: usize) -> (Pane, SectionStream<'_>) {
        let mut stream = SectionStream::new(BinaryReader::new(bytes), count as u16);
        let section = stream.next_section().unwrap().unwrap();
        let mut root = Pane::decode(section.payload).unwrap();
        read_children(&mut stream, &mut root.children, 0).unwrap();
        (root, stream)
    }

    #[test]
    fn test_childless_node_has_no_markers() {
        let root = Pane::new(PaneProperties::new("RootPane"));
        let records = flatten(&root, None).unwrap();
        assert_eq!(records.len(), 1);

        let bytes = write_records(&records);
        let (decoded, stream) = decode_root(&bytes, records.len());
        assert!(decoded.children.is_empty());
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn test_nested_scopes() {
        let mut root = Pane::new(PaneProperties::new("RootPane"));
        root.children = vec![
            pane("N_a", vec![pane("N_a1", vec![]), pane("N_a2", vec![])]),
            pane("N_b", vec![]),
        ];
        let mut group = Group::new("RootGroup");
        group.children = vec![Node::Group(Group::new("G_sub"))];

        let records = flatten(&root, Some(&group)).unwrap();
        let kinds: Vec<_> = records.iter().map(|r| r.kind().to_string()).collect();
        assert_eq!(
            kinds,
            [
                "pan1", "pas1", "pan1", "pas1", "pan1", "pan1", "pae1", "pan1", "pae1", "grp1",
                "grs1", "grp1", "gre1"
            ]
        );

        let bytes = write_records(&records);
        let (decoded, mut stream) = decode_root(&bytes, records.len());
        assert_eq!(decoded, root);

        let section = stream.next_section().unwrap().unwrap();
        let mut decoded_group = Group::decode(section.payload).unwrap();
        read_children(&mut stream, &mut decoded_group.children, 0).unwrap();
        assert_eq!(decoded_group, group);
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn test_unknown_section_is_skipped_in_child_list() {
        let mut writer = BinaryWriter::new();
        Pane::new(PaneProperties::new("RootPane"))
            .encode(SectionKind::Pane, &mut writer)
            .unwrap();
        write_header(&mut writer, SectionKind::PaneStart, 8);
        write_header(&mut writer, SectionKind::Unknown(*b"usd1"), 16);
        writer.write_bytes(&[0xAA; 8]);
        Pane::new(PaneProperties::new("N_after"))
            .encode(SectionKind::Bounding, &mut writer)
            .unwrap();
        write_header(&mut writer, SectionKind::PaneEnd, 8);
        let bytes = writer.into_inner();

        let (decoded, stream) = decode_root(&bytes, 5);
        assert_eq!(decoded.children.len(), 1);
        assert_eq!(decoded.children[0].kind(), SectionKind::Bounding);
        assert_eq!(decoded.children[0].name(), "N_after");
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn test_stream_ending_inside_child_list() {
        let root = {
            let mut root = Pane::new(PaneProperties::new("RootPane"));
            root.children = vec![pane("N_only", vec![])];
            root
        };
        let records = flatten(&root, None).unwrap();
        let bytes = write_records(&records);
        // Budget ends before the closing marker.
        let (decoded, stream) = decode_root(&bytes, records.len() - 1);
        assert_eq!(decoded, root);
        assert_eq!(stream.remaining(), 0);
    }

    /// A root pane with `levels` single-child panes chained below it.
    fn chain(levels: usize) -> Pane {
        let mut pane = Pane::new(PaneProperties::new("N_leaf"));
        for _ in 0..levels {
            let mut parent = Pane::new(PaneProperties::new("N_link"));
            parent.children.push(Node::Pane(pane));
            pane = parent;
        }
        pane
    }

    fn depth(nodes: &[Node]) -> usize {
        nodes
            .iter()
            .map(|node| 1 + depth(node.children()))
            .max()
            .unwrap_or(0)
    }

    /// Nested `pan1`/`pas1` pairs written directly, `levels` lists deep.
    fn nested_sections(levels: usize) -> (Vec<u8>, usize) {
        let mut writer = BinaryWriter::new();
        let mut count = 0;
        for level in 0..=levels {
            Pane::new(PaneProperties::new(format!("N_{level}")))
                .encode(SectionKind::Pane, &mut writer)
                .unwrap();
            count += 1;
            if level < levels {
                write_header(&mut writer, SectionKind::PaneStart, 8);
                count += 1;
            }
        }
        for _ in 0..levels {
            write_header(&mut writer, SectionKind::PaneEnd, 8);
            count += 1;
        }
        (writer.into_inner(), count)
    }

    fn decode_nested(bytes: &[u8], count: usize) -> Result<Pane> {
        let mut stream = SectionStream::new(BinaryReader::new(bytes), count as u16);
        let section = stream.next_section()?.ok_or(Error::MissingRootPane)?;
        let mut root = Pane::decode(section.payload)?;
        read_children(&mut stream, &mut root.children, 0)?;
        Ok(root)
    }

    #[test]
    fn test_nesting_at_limit_decodes() {
        let (bytes, count) = nested_sections(MAX_TREE_DEPTH);
        let root = decode_nested(&bytes, count).unwrap();
        assert_eq!(depth(&root.children), MAX_TREE_DEPTH);
    }

    #[test]
    fn test_nesting_past_limit_is_rejected() {
        let (bytes, count) = nested_sections(MAX_TREE_DEPTH + 1);
        assert!(matches!(
            decode_nested(&bytes, count),
            Err(Error::TreeTooDeep { max: MAX_TREE_DEPTH })
        ));
    }

    #[test]
    fn test_flatten_depth_limit() {
        let root = chain(MAX_TREE_DEPTH);
        let records = flatten(&root, None).unwrap();
        assert_eq!(records.len(), 1 + 3 * MAX_TREE_DEPTH);

        let root = chain(MAX_TREE_DEPTH + 1);
        assert!(matches!(
            flatten(&root, None),
            Err(Error::TreeTooDeep { max: MAX_TREE_DEPTH })
        ));

        let mut group = Group::new("RootGroup");
        for _ in 0..=MAX_TREE_DEPTH {
            let mut parent = Group::new("G_link");
            parent.children.push(Node::Group(group));
            group = parent;
        }
        let pane = Pane::new(PaneProperties::new("RootPane"));
        assert!(matches!(
            flatten(&pane, Some(&group)),
            Err(Error::TreeTooDeep { .. })
        ));
    }

    #[test]
    fn test_subtree_len() {
        let node = pane("N_a", vec![pane("N_b", vec![pane("N_c", vec![])]), pane("N_d", vec![])]);
        assert_eq!(node.subtree_len(), 4);
        assert_eq!(node.children()[0].name(), "N_b");
        assert!(Node::Group(Group::new("G")).properties().is_none());
    }
}
