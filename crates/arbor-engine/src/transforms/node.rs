use log::{debug, warn};

use crate::editor::Editor;
use crate::error::{EngineError, Result};
use crate::location::{Affinity, Location, Path, Point, RangeAffinity};
use crate::node::{Element, Node, Props, TYPE_KEY};
use crate::operation::Operation;
use crate::options::{Match, Mode, Options};
use crate::refs::PathRef;

use super::default_match;

impl Editor {
    /// Insert `nodes` at `options.at`.
    ///
    /// Without a target the nodes go to the selection (or the end of the
    /// document) and the cursor moves to the end of the last inserted node.
    /// Inserting at a point splits the enclosing text, inline or block first,
    /// depending on what is being inserted.
    pub fn insert_nodes(&mut self, nodes: Vec<Node>, options: &Options) -> Result<()> {
        let Some(first) = nodes.first() else {
            return Ok(());
        };
        let default_match = if first.is_text() {
            Match::text()
        } else if self.node_is_inline(first) {
            Match::inline_or_text()
        } else {
            Match::block()
        };

        self.without_normalizing(|editor| {
            let mut select = options.select;
            let at = match &options.at {
                Some(at) => at.clone(),
                None => {
                    select.get_or_insert(true);
                    editor.default_insert_location()
                }
            };

            let matches = options.matches.clone().unwrap_or(default_match);
            let path = match at {
                Location::Path(path) => path,
                Location::Point(point) => match editor.split_for_insert(point, matches, options)? {
                    Some(path) => path,
                    None => return Ok(()),
                },
                Location::Range(range) => {
                    let range = if options.hanging {
                        range
                    } else {
                        editor.unhang_range(&range, options.voids)?
                    };
                    let Some(point) = editor.delete_range(range)? else {
                        return Ok(());
                    };
                    match editor.split_for_insert(point, matches, options)? {
                        Some(path) => path,
                        None => return Ok(()),
                    }
                }
            };

            let parent = path.parent()?;
            if !options.voids && editor.is_within_void(&parent)? {
                debug!("refusing to insert into void at {parent}");
                return Ok(());
            }

            let mut index = path.last_index().unwrap_or(0);
            for node in nodes {
                editor.apply(Operation::InsertNode {
                    path: parent.child(index),
                    node,
                })?;
                index += 1;
            }

            if select.unwrap_or(false)
                && let Ok(end) = editor.end(&Location::Path(parent.child(index - 1)))
            {
                editor.select(end)?;
            }
            Ok(())
        })
    }

    /// Split at `point` so that a node can be inserted there, returning the
    /// path the insertion should use.
    fn split_for_insert(&mut self, point: Point, matches: Match, options: &Options) -> Result<Option<Path>> {
        let mode = options.mode_or(Mode::Lowest);
        let found = self
            .find(
                &Options::new()
                    .at(point.path.clone())
                    .matching(matches.clone())
                    .mode(mode)
                    .voids(options.voids),
            )?
            .map(|(_, path)| path);
        let Some(match_path) = found else {
            return Ok(None);
        };

        let at_end = self.is_end(&point, &Location::Path(match_path.clone()))?;
        let path_ref = self.path_ref(match_path, Some(Affinity::Forward));
        self.split_nodes(
            &Options::new()
                .at(point)
                .matching(matches)
                .mode(mode)
                .voids(options.voids),
        )?;
        let Some(path) = path_ref.unref(self) else {
            warn!("insertion target vanished while splitting");
            return Ok(None);
        };
        Ok(Some(if at_end { path.next()? } else { path }))
    }

    fn is_within_void(&self, path: &Path) -> Result<bool> {
        let own = self
            .node(path)?
            .as_element()
            .is_some_and(|element| !element.is_root() && self.is_void(element));
        Ok(own || self.void(&Options::new().at(path.clone()))?.is_some())
    }

    /// Remove the matched nodes. Without a predicate a path target removes
    /// exactly that node and a range removes the blocks it covers.
    pub fn remove_nodes(&mut self, options: &Options) -> Result<()> {
        self.without_normalizing(|editor| {
            let Some(mut at) = editor.resolve_at(options) else {
                return Ok(());
            };
            let matches = options.matches.clone().unwrap_or_else(|| default_match(&at));
            if !options.hanging
                && let Location::Range(range) = &at
            {
                at = Location::Range(editor.unhang_range(range, options.voids)?);
            }

            let refs = editor.target_refs(at, matches, options.mode_or(Mode::Lowest), options.voids)?;
            for path_ref in refs {
                let Some(path) = path_ref.unref(editor) else {
                    continue;
                };
                if path.is_empty() {
                    continue;
                }
                let node = editor.node(&path)?.clone();
                editor.apply(Operation::RemoveNode { path, node })?;
            }
            Ok(())
        })
    }

    /// Merge `props` into the properties of every matched element (or the
    /// marks of matched texts). A `null` value removes the key. The root is
    /// never changed, and `text`/`children` cannot be set this way.
    ///
    /// With `split`, a range target first splits the matched nodes at its
    /// edges so only the covered part changes.
    pub fn set_nodes(&mut self, props: Props, options: &Options) -> Result<()> {
        for (key, value) in &props {
            match key.as_str() {
                "text" | "children" => {
                    return Err(EngineError::InvalidProperty {
                        key: key.clone(),
                        reason: "content cannot be replaced through properties".to_string(),
                    });
                }
                TYPE_KEY if !value.is_string() => {
                    return Err(EngineError::InvalidProperty {
                        key: key.clone(),
                        reason: "element type must be a string".to_string(),
                    });
                }
                _ => {}
            }
        }

        self.without_normalizing(|editor| {
            let Some(mut at) = editor.resolve_at(options) else {
                return Ok(());
            };
            let matches = options.matches.clone().unwrap_or_else(|| default_match(&at));
            let mode = options.mode_or(Mode::Lowest);

            if !options.hanging
                && let Location::Range(range) = &at
            {
                at = Location::Range(editor.unhang_range(range, options.voids)?);
            }

            if options.split
                && let Location::Range(range) = at.clone()
            {
                if range.is_collapsed() && !editor.leaf(&Location::Point(range.anchor.clone()))?.0.is_empty() {
                    return Ok(());
                }
                let range_ref = editor.range_ref(range.clone(), RangeAffinity::Inward);
                let (start, end) = range.edges();
                let split_mode = if mode == Mode::Lowest { Mode::Lowest } else { Mode::Highest };

                let end_at_end = editor.is_end(&end, &Location::Path(end.path.clone()))?;
                editor.split_nodes(
                    &Options::new()
                        .at(end)
                        .matching(matches.clone())
                        .mode(split_mode)
                        .voids(options.voids)
                        .always(!end_at_end),
                )?;
                let start_at_start = editor.is_start(&start, &Location::Path(start.path.clone()))?;
                editor.split_nodes(
                    &Options::new()
                        .at(start)
                        .matching(matches.clone())
                        .mode(split_mode)
                        .voids(options.voids)
                        .always(!start_at_start),
                )?;

                let Some(range) = range_ref.unref(editor) else {
                    return Ok(());
                };
                if options.at.is_none() {
                    editor.select(range.clone())?;
                }
                at = Location::Range(range);
            }

            let changes: Vec<(Path, Props, Props)> = editor
                .nodes(
                    &Options::new()
                        .at(at)
                        .matching(matches)
                        .mode(mode)
                        .voids(options.voids),
                )?
                .filter(|(_, path)| !path.is_empty())
                .filter_map(|(node, path)| {
                    property_changes(node, &props).map(|(properties, new_properties)| (path, properties, new_properties))
                })
                .collect();

            for (path, properties, new_properties) in changes {
                editor.apply(Operation::SetNode {
                    path,
                    properties,
                    new_properties,
                })?;
            }
            Ok(())
        })
    }

    /// Remove the named properties (or marks) from the matched nodes.
    pub fn unset_nodes(&mut self, keys: &[&str], options: &Options) -> Result<()> {
        let props = keys
            .iter()
            .map(|key| (key.to_string(), serde_json::Value::Null))
            .collect();
        self.set_nodes(props, options)
    }

    /// Wrap the matched nodes in a copy of `element`.
    ///
    /// Contiguous matches under the same parent share one wrapper. With
    /// `split`, the nodes at the edges of a range target are split first so
    /// only the covered content moves into the wrapper.
    pub fn wrap_nodes(&mut self, element: Element, options: &Options) -> Result<()> {
        let inline = self.is_inline(&element);

        self.without_normalizing(|editor| {
            let Some(mut at) = editor.resolve_at(options) else {
                return Ok(());
            };
            let matches = match (&options.matches, &at) {
                (Some(matches), _) => matches.clone(),
                (None, Location::Path(path)) => Match::path(path.clone()),
                (None, _) if inline => Match::inline_or_text(),
                (None, _) => Match::block(),
            };

            if options.split
                && let Location::Range(range) = at.clone()
            {
                let (start, end) = range.edges();
                let range_ref = editor.range_ref(range, RangeAffinity::Inward);
                editor.split_nodes(&Options::new().at(end).matching(matches.clone()).voids(options.voids))?;
                editor.split_nodes(&Options::new().at(start).matching(matches.clone()).voids(options.voids))?;
                let Some(range) = range_ref.unref(editor) else {
                    return Ok(());
                };
                if options.at.is_none() {
                    editor.select(range.clone())?;
                }
                at = Location::Range(range);
            }

            let scope_match = if inline { Match::block() } else { Match::path(Path::root()) };
            let roots = editor
                .nodes(
                    &Options::new()
                        .at(at.clone())
                        .matching(scope_match)
                        .mode(Mode::Lowest)
                        .voids(options.voids),
                )?
                .paths();

            for root_path in roots {
                let scope = match &at {
                    Location::Range(range) => {
                        match range.intersection(&editor.range(&Location::Path(root_path))?) {
                            Some(scope) => Location::Range(scope),
                            None => continue,
                        }
                    }
                    other => other.clone(),
                };

                let matched = editor
                    .nodes(
                        &Options::new()
                            .at(scope)
                            .matching(matches.clone())
                            .mode(options.mode_or(Mode::Lowest))
                            .voids(options.voids),
                    )?
                    .paths();
                let (Some(first), Some(last)) = (matched.first(), matched.last()) else {
                    continue;
                };
                if first.is_empty() && last.is_empty() {
                    continue;
                }

                let common = if first == last { first.parent()? } else { first.common(last) };
                let covered = editor.range_between(&Location::Path(first.clone()), &Location::Path(last.clone()))?;
                let wrapper_path = last.slice(common.len() + 1).next()?;
                let wrapper = Node::Element(Element {
                    children: Vec::new(),
                    ..element.clone()
                });

                editor.insert_nodes(vec![wrapper], &Options::new().at(wrapper_path.clone()).voids(options.voids))?;
                editor.move_nodes(
                    wrapper_path.child(0),
                    &Options::new()
                        .at(covered)
                        .matching(Match::child_of(common))
                        .voids(options.voids),
                )?;
            }
            Ok(())
        })
    }

    /// Dissolve each matched element, lifting its children into its parent.
    ///
    /// With `split` and a range target, only the children inside the range are
    /// lifted; the element is split around them.
    pub fn unwrap_nodes(&mut self, options: &Options) -> Result<()> {
        self.without_normalizing(|editor| {
            let Some(at) = editor.resolve_at(options) else {
                return Ok(());
            };
            let matches = options.matches.clone().unwrap_or_else(|| default_match(&at));
            let at = match at {
                Location::Path(path) => Location::Range(editor.range(&Location::Path(path))?),
                other => other,
            };
            let range_ref = at
                .as_range()
                .cloned()
                .map(|range| editor.range_ref(range, RangeAffinity::Forward));

            let mut refs = editor.target_refs(at, matches, options.mode_or(Mode::Lowest), options.voids)?;
            refs.reverse();
            for path_ref in refs {
                let Some(path) = path_ref.unref(editor) else {
                    continue;
                };
                let mut range = editor.range(&Location::Path(path.clone()))?;
                if options.split
                    && let Some(current) = range_ref.as_ref().and_then(|range_ref| range_ref.current(editor))
                {
                    match current.intersection(&range) {
                        Some(intersection) => range = intersection,
                        None => continue,
                    }
                }
                editor.lift_nodes(
                    &Options::new()
                        .at(range)
                        .matching(Match::child_of(path))
                        .voids(options.voids),
                )?;
            }

            if let Some(range_ref) = range_ref {
                range_ref.unref(editor);
            }
            Ok(())
        })
    }

    /// Move each matched node up one level, splitting its parent when the node
    /// sits in the middle of it. A parent left empty is removed.
    pub fn lift_nodes(&mut self, options: &Options) -> Result<()> {
        self.without_normalizing(|editor| {
            let Some(at) = editor.resolve_at(options) else {
                return Ok(());
            };
            let matches = options.matches.clone().unwrap_or_else(|| default_match(&at));
            let paths = editor
                .nodes(
                    &Options::new()
                        .at(at)
                        .matching(matches)
                        .mode(options.mode_or(Mode::Lowest))
                        .voids(options.voids),
                )?
                .paths();
            if let Some(shallow) = paths.iter().find(|path| path.len() < 2) {
                return Err(EngineError::invalid_location(
                    shallow,
                    "only nodes at depth two or more can be lifted",
                ));
            }

            let voids = options.voids;
            let refs: Vec<PathRef> = paths
                .into_iter()
                .map(|path| editor.path_ref(path, Some(Affinity::Forward)))
                .collect();
            for path_ref in refs {
                let Some(path) = path_ref.unref(editor) else {
                    continue;
                };
                let parent_path = path.parent()?;
                let length = editor.node(&parent_path)?.children().len();
                let index = path.last_index().unwrap_or(0);
                let at_path = Options::new().at(path.clone()).voids(voids);

                if length == 1 {
                    editor.move_nodes(parent_path.next()?, &at_path)?;
                    editor.remove_nodes(&Options::new().at(parent_path).voids(voids))?;
                } else if index == 0 {
                    editor.move_nodes(parent_path, &at_path)?;
                } else if index == length - 1 {
                    editor.move_nodes(parent_path.next()?, &at_path)?;
                } else {
                    editor.split_nodes(&Options::new().at(path.next()?).voids(voids))?;
                    editor.move_nodes(parent_path.next()?, &at_path)?;
                }
            }
            Ok(())
        })
    }

    /// Split the matched ancestors of a point.
    ///
    /// Nodes are split from the leaf upwards until the highest match. A
    /// split at the very edge of a node is skipped unless `always` is set.
    /// A range target is deleted first; a path target splits its parent right
    /// before the node. Without a target the selection follows the split.
    pub fn split_nodes(&mut self, options: &Options) -> Result<()> {
        self.without_normalizing(|editor| {
            let Some(at) = editor.resolve_at(options) else {
                return Ok(());
            };
            let mut matches = options.matches.clone().unwrap_or_else(Match::block);
            let mode = options.mode_or(Mode::Lowest);
            let mut height = options.height;
            let mut always = options.always;

            let at = match at {
                Location::Range(range) => match editor.delete_range(range)? {
                    Some(point) => point,
                    None => return Ok(()),
                },
                Location::Point(point) => point,
                Location::Path(path) => {
                    let point = editor.start(&Location::Path(path.clone()))?;
                    matches = Match::path(path.parent()?);
                    height = point.path.len() - path.len() + 1;
                    always = true;
                    point
                }
            };

            let Some(highest) = editor
                .find(
                    &Options::new()
                        .at(at.clone())
                        .matching(matches)
                        .mode(mode)
                        .voids(options.voids),
                )?
                .map(|(_, path)| path)
            else {
                return Ok(());
            };

            let original = at.clone();
            let mut at = at;
            let void_entry = editor
                .void(&Options::new().at(at.clone()).mode(Mode::Highest))?
                .map(|(node, path)| (path, editor.node_is_inline(node)));
            if !options.voids
                && let Some((void_path, inline)) = void_entry
            {
                if inline {
                    at = match editor.after(&Location::Path(void_path.clone()), &Options::new())? {
                        Some(after) => after,
                        None => {
                            let after_path = void_path.next()?;
                            editor.insert_nodes(
                                vec![Node::text("")],
                                &Options::new().at(after_path.clone()).voids(options.voids),
                            )?;
                            editor.start(&Location::Path(after_path))?
                        }
                    };
                }
                height = at.path.len() - void_path.len() + 1;
                always = true;
            }

            let before_ref = editor.point_ref(original, Some(Affinity::Backward));
            let after_ref = editor.point_ref(at.clone(), Some(Affinity::Forward));
            let result = editor.split_levels(&at, &highest, height, always, options.voids, &before_ref);
            before_ref.unref(editor);
            let after = after_ref.unref(editor);
            result?;

            if options.at.is_none() {
                let point = match after {
                    Some(point) => point,
                    None => editor.document_end()?,
                };
                editor.select(point)?;
            }
            Ok(())
        })
    }

    fn split_levels(
        &mut self,
        at: &Point,
        highest: &Path,
        height: usize,
        always: bool,
        voids: bool,
        before_ref: &crate::refs::PointRef,
    ) -> Result<()> {
        let depth = at.path.len().saturating_sub(height);
        let lowest = at.path.slice(depth);
        let mut position = if height == 0 {
            at.offset
        } else {
            at.path.get(depth).copied().unwrap_or(0)
        };

        let levels: Vec<(Path, Props, bool)> = self
            .levels(&Options::new().at(lowest).reverse(true).voids(voids))?
            .into_iter()
            .map(|(node, path)| {
                let void = node.as_element().is_some_and(|element| self.is_void(element));
                (path, node.extract_props(), void)
            })
            .collect();

        for (path, properties, void) in levels {
            if path.len() < highest.len() || path.is_empty() || (!voids && void) {
                break;
            }
            let Some(point) = before_ref.current(self) else {
                break;
            };
            let node_at = Location::Path(path.clone());
            let is_end = self.is_end(&point, &node_at)?;
            let split = always || !self.is_edge(&point, &node_at)?;
            if split {
                self.apply(Operation::SplitNode {
                    path: path.clone(),
                    position,
                    properties,
                })?;
            }
            position = path.last_index().unwrap_or(0) + usize::from(split || is_end);
        }
        Ok(())
    }

    /// Merge the matched node into the one before it.
    ///
    /// Nodes that are not siblings are moved next to each other first, and an
    /// ancestor that would be left empty by the move is removed. An empty
    /// previous node is removed instead of merged into.
    pub fn merge_nodes(&mut self, options: &Options) -> Result<()> {
        self.without_normalizing(|editor| {
            let Some(at) = editor.resolve_at(options) else {
                return Ok(());
            };
            let matches = match (&options.matches, &at) {
                (Some(matches), _) => matches.clone(),
                (None, Location::Path(path)) => Match::child_of(path.parent()?),
                (None, _) => Match::block(),
            };
            let mode = options.mode_or(Mode::Lowest);

            let at = match at {
                Location::Range(range) => {
                    let range = if options.hanging {
                        range
                    } else {
                        editor.unhang_range(&range, options.voids)?
                    };
                    if range.is_collapsed() {
                        Location::Point(range.anchor)
                    } else {
                        let Some(end) = editor.delete_range(range)? else {
                            return Ok(());
                        };
                        if options.at.is_none() {
                            editor.select(end.clone())?;
                        }
                        Location::Point(end)
                    }
                }
                other => other,
            };

            let query = Options::new()
                .at(at)
                .matching(matches)
                .mode(mode)
                .voids(options.voids);
            let current = editor.find(&query)?.map(|(_, path)| path);
            let previous = editor.previous(&query)?.map(|(_, path)| path);
            let (Some(path), Some(prev_path)) = (current, previous) else {
                return Ok(());
            };
            if path.is_empty() || prev_path.is_empty() {
                return Ok(());
            }

            let new_path = prev_path.next()?;
            let common = path.common(&prev_path);
            let empty_ancestor = (common.len()..path.len())
                .map(|len| path.slice(len))
                .filter(|ancestor| !ancestor.is_empty())
                .find(|ancestor| {
                    editor
                        .node(ancestor)
                        .is_ok_and(|node| editor.has_single_child_nest(node))
                });

            let (position, properties, remove_previous) = match (editor.node(&path)?, editor.node(&prev_path)?) {
                (Node::Text(text), Node::Text(prev)) => (
                    prev.len(),
                    text.marks.clone(),
                    prev.is_empty() && prev_path.last_index() != Some(0),
                ),
                (Node::Element(element), Node::Element(prev)) => {
                    (prev.children.len(), element.extract_props(), editor.is_empty(prev))
                }
                _ => {
                    return Err(EngineError::invariant(
                        &path,
                        format!("cannot merge a text and an element at {prev_path}"),
                    ));
                }
            };

            let empty_ref = empty_ancestor.map(|ancestor| editor.path_ref(ancestor, Some(Affinity::Forward)));
            if !path.is_sibling(&prev_path) {
                editor.move_nodes(new_path.clone(), &Options::new().at(path.clone()).voids(options.voids))?;
            }
            if let Some(empty) = empty_ref.as_ref().and_then(|empty_ref| empty_ref.current(editor)) {
                editor.remove_nodes(&Options::new().at(empty).voids(options.voids))?;
            }

            if remove_previous {
                editor.remove_nodes(&Options::new().at(prev_path).voids(options.voids))?;
            } else {
                editor.apply(Operation::MergeNode {
                    path: new_path,
                    position,
                    properties,
                })?;
            }

            if let Some(empty_ref) = empty_ref {
                empty_ref.unref(editor);
            }
            Ok(())
        })
    }

    /// A void, or an element whose only descendants form a single chain.
    fn has_single_child_nest(&self, node: &Node) -> bool {
        match node {
            Node::Text(_) => true,
            Node::Element(element) if element.is_root() => false,
            Node::Element(element) if self.is_void(element) => true,
            Node::Element(element) => match element.children.as_slice() {
                [only] => self.has_single_child_nest(only),
                _ => false,
            },
        }
    }

    /// Move the matched nodes so the first lands at `to`, keeping their order.
    pub fn move_nodes(&mut self, to: Path, options: &Options) -> Result<()> {
        self.without_normalizing(|editor| {
            let Some(at) = editor.resolve_at(options) else {
                return Ok(());
            };
            let matches = options.matches.clone().unwrap_or_else(|| default_match(&at));
            let to_ref = editor.path_ref(to, Some(Affinity::Forward));
            let refs = editor.target_refs(at, matches, options.mode_or(Mode::Lowest), options.voids)?;

            for path_ref in refs {
                let (Some(path), Some(new_path)) = (path_ref.unref(editor), to_ref.current(editor)) else {
                    continue;
                };
                if !path.is_empty() {
                    editor.apply(Operation::MoveNode {
                        path: path.clone(),
                        new_path: new_path.clone(),
                    })?;
                }
                if let Some(current) = to_ref.current(editor)
                    && new_path.is_sibling(&path)
                    && new_path.is_after(&path)
                {
                    to_ref.set(editor, current.next()?);
                }
            }

            to_ref.unref(editor);
            Ok(())
        })
    }

    /// Refs to every node a transform targets, in document order.
    fn target_refs(&mut self, at: Location, matches: Match, mode: Mode, voids: bool) -> Result<Vec<PathRef>> {
        let paths = self
            .nodes(&Options::new().at(at).matching(matches).mode(mode).voids(voids))?
            .paths();
        Ok(paths
            .into_iter()
            .map(|path| self.path_ref(path, Some(Affinity::Forward)))
            .collect())
    }
}

/// Old and new values for the keys of `props` that differ on `node`.
fn property_changes(node: &Node, props: &Props) -> Option<(Props, Props)> {
    let mut properties = Props::new();
    let mut new_properties = Props::new();
    for (key, value) in props {
        let current = node.prop(key);
        if current.as_ref() == Some(value) || (value.is_null() && current.is_none()) {
            continue;
        }
        if let Some(current) = current {
            properties.insert(key.clone(), current);
        }
        if !value.is_null() {
            new_properties.insert(key.clone(), value.clone());
        }
    }
    (!properties.is_empty() || !new_properties.is_empty()).then_some((properties, new_properties))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Range;
    use crate::node::Text;
    use crate::schema::Schema;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn paragraph(text: &str) -> Node {
        Node::element("paragraph", vec![Node::text(text)])
    }

    fn editor(children: Vec<Node>) -> Editor {
        Editor::with_schema(children, Schema::default().with_inline(["link"]))
    }

    fn props(value: serde_json::Value) -> Props {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_insert_nodes_splits_text_at_cursor() {
        let mut editor = editor(vec![paragraph("abcd")]);
        editor.select(Point::new([0, 0], 2)).unwrap();
        editor
            .insert_nodes(vec![Node::element("link", vec![Node::text("x")])], &Options::new())
            .unwrap();

        assert_eq!(
            editor.children(),
            &[Node::element(
                "paragraph",
                vec![
                    Node::text("ab"),
                    Node::element("link", vec![Node::text("x")]),
                    Node::text("cd"),
                ]
            )]
        );
        assert_eq!(editor.selection(), Some(&Range::collapsed(Point::new([0, 1, 0], 1))));
    }

    #[test]
    fn test_insert_block_at_end_of_block_goes_after_it() {
        let mut editor = editor(vec![paragraph("one")]);
        editor.select(Point::new([0, 0], 3)).unwrap();
        editor.insert_nodes(vec![paragraph("two")], &Options::new()).unwrap();
        assert_eq!(editor.children(), &[paragraph("one"), paragraph("two")]);
        assert_eq!(editor.selection(), Some(&Range::collapsed(Point::new([1, 0], 3))));
    }

    #[test]
    fn test_set_nodes_merges_and_unsets_properties() {
        let mut editor = editor(vec![paragraph("a")]);
        let at = Options::new().at(Path::from([0]));
        editor
            .set_nodes(props(json!({ "type": "check-list-item", "checked": true })), &at)
            .unwrap();
        assert_eq!(editor.node(&Path::from([0])).unwrap().kind(), Some("check-list-item"));
        assert_eq!(editor.node(&Path::from([0])).unwrap().prop("checked"), Some(json!(true)));

        editor.unset_nodes(&["checked"], &at).unwrap();
        assert_eq!(editor.node(&Path::from([0])).unwrap().prop("checked"), None);
    }

    #[test]
    fn test_set_nodes_rejects_content_keys() {
        let mut editor = editor(vec![paragraph("a")]);
        let err = editor
            .set_nodes(props(json!({ "text": "b" })), &Options::new().at(Path::from([0])))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidProperty { .. }));
        let err = editor
            .set_nodes(props(json!({ "type": 3 })), &Options::new().at(Path::from([0])))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidProperty { .. }));
        assert_eq!(editor.children(), &[paragraph("a")]);
    }

    #[test]
    fn test_set_nodes_with_split_marks_only_the_range() {
        let mut editor = editor(vec![paragraph("hello world")]);
        editor
            .set_nodes(
                props(json!({ "bold": true })),
                &Options::new()
                    .at(Range::new(Point::new([0, 0], 0), Point::new([0, 0], 5)))
                    .matching(Match::text())
                    .split(true),
            )
            .unwrap();
        assert_eq!(
            editor.children(),
            &[Node::element(
                "paragraph",
                vec![Node::Text(Text::new("hello").with_mark("bold", true)), Node::text(" world")]
            )]
        );
    }

    #[test]
    fn test_wrap_then_unwrap_restores_siblings() {
        let original = vec![paragraph("one"), paragraph("two"), paragraph("three")];
        let mut editor = editor(original.clone());
        let covered = Range::new(Point::new([0, 0], 0), Point::new([1, 0], 3));

        editor
            .wrap_nodes(Element::new("block-quote"), &Options::new().at(covered))
            .unwrap();
        assert_eq!(
            editor.children(),
            &[
                Node::element("block-quote", vec![paragraph("one"), paragraph("two")]),
                paragraph("three"),
            ]
        );

        editor
            .unwrap_nodes(&Options::new().at(Path::from([0])).matching(Match::kind("block-quote")))
            .unwrap();
        assert_eq!(editor.children(), original.as_slice());
    }

    #[test]
    fn test_wrap_inline_with_split_wraps_only_selected_text() {
        let mut editor = editor(vec![paragraph("click here now")]);
        editor
            .select(Range::new(Point::new([0, 0], 6), Point::new([0, 0], 10)))
            .unwrap();
        editor
            .wrap_nodes(
                Element::new("link").with_prop("url", "https://x.test"),
                &Options::new().split(true),
            )
            .unwrap();

        assert_eq!(
            editor.children(),
            &[Node::element(
                "paragraph",
                vec![
                    Node::text("click "),
                    Node::Element(
                        Element::new("link")
                            .with_prop("url", "https://x.test")
                            .with_children(vec![Node::text("here")])
                    ),
                    Node::text(" now"),
                ]
            )]
        );
    }

    #[test]
    fn test_lift_middle_child_splits_parent() {
        let mut editor = editor(vec![Node::element(
            "bulleted-list",
            vec![paragraph("a"), paragraph("b"), paragraph("c")],
        )]);
        editor.lift_nodes(&Options::new().at(Path::from([0, 1]))).unwrap();
        assert_eq!(
            editor.children(),
            &[
                Node::element("bulleted-list", vec![paragraph("a")]),
                paragraph("b"),
                Node::element("bulleted-list", vec![paragraph("c")]),
            ]
        );
    }

    #[test]
    fn test_lift_top_level_node_is_rejected() {
        let mut editor = editor(vec![paragraph("a")]);
        let err = editor.lift_nodes(&Options::new().at(Path::from([0]))).unwrap_err();
        assert!(matches!(err, EngineError::InvalidLocation { .. }));
        assert_eq!(editor.children(), &[paragraph("a")]);
    }

    #[test]
    fn test_split_and_merge_blocks() {
        let mut editor = editor(vec![paragraph("onetwo")]);
        editor.select(Point::new([0, 0], 3)).unwrap();
        editor.split_nodes(&Options::new().always(true)).unwrap();
        assert_eq!(editor.children(), &[paragraph("one"), paragraph("two")]);
        assert_eq!(editor.selection(), Some(&Range::collapsed(Point::new([1, 0], 0))));

        editor.merge_nodes(&Options::new().at(Path::from([1]))).unwrap();
        assert_eq!(editor.children(), &[paragraph("onetwo")]);
    }

    #[test]
    fn test_move_nodes_keeps_order() {
        let mut editor = editor(vec![paragraph("a"), paragraph("b"), paragraph("c")]);
        editor
            .move_nodes(
                Path::from([3]),
                &Options::new()
                    .at(Range::new(Point::new([0, 0], 0), Point::new([1, 0], 1)))
                    .matching(Match::child_of(Path::root())),
            )
            .unwrap();
        assert_eq!(editor.children(), &[paragraph("c"), paragraph("a"), paragraph("b")]);
    }

    #[test]
    fn test_remove_nodes_by_predicate() {
        let mut editor = editor(vec![paragraph("a"), Node::element("quote", vec![Node::text("b")])]);
        editor
            .remove_nodes(&Options::new().at(Path::root()).matching(Match::kind("quote")))
            .unwrap();
        assert_eq!(editor.children(), &[paragraph("a")]);
    }
}
