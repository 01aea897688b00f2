use {
    common::{
        arena::Ref,
        ir::{block::Block, function::Function, statement::Statement},
        HashMap, HashSet,
    },
    dot::{Edges, GraphWalk, LabelText, Labeller, Nodes},
    std::io,
};

/// Renders the control flow graph of `function` reachable from its entry block
pub fn render<W: io::Write>(w: &mut W, function: &Function) -> io::Result<()> {
    let mut graph = Graph::new(function);

    graph.process(function.entry_block());

    dot::render(&graph, w)
}

type NodeId = usize;
/// Source, target and the successor slot of the terminator
type EdgeId = (NodeId, NodeId, usize);

struct Graph<'a> {
    function: &'a Function,
    nodes: Vec<NodeId>,
    edges: Vec<EdgeId>,
    node_labels: HashMap<NodeId, String>,
    edge_labels: HashMap<EdgeId, &'static str>,
}

impl<'a> Graph<'a> {
    fn new(function: &'a Function) -> Self {
        Self {
            function,
            nodes: vec![],
            edges: vec![],
            edge_labels: HashMap::default(),
            node_labels: HashMap::default(),
        }
    }

    /// Visits every block reachable from `entry`, depth first
    fn process(&mut self, entry: Ref<Block>) {
        let mut visited = HashSet::default();
        let mut worklist = vec![entry];

        while let Some(node) = worklist.pop() {
            let id = node.index();

            if !visited.insert(id) {
                continue;
            }

            let function = self.function;
            let block = node.get(function.arena());

            let statements = block
                .statements()
                .iter()
                .map(|s| format!("{}\\l", s.get(block.arena())))
                .collect::<String>()
                .replace('<', r"\<")
                .replace('>', r"\>")
                .replace('{', r"\{")
                .replace('}', r"\}")
                .replace('|', r"\|");

            let node_label = format!("{{bb{}|{statements}}}", node.index());

            let is_branch = block
                .terminator_statement()
                .is_some_and(|t| matches!(t.get(block.arena()), Statement::Branch { .. }));

            let targets = block.targets();

            for (slot, target) in targets.iter().enumerate() {
                let edge = (id, target.index(), slot);
                self.edges.push(edge);
                self.edge_labels.insert(
                    edge,
                    match (is_branch, slot) {
                        (false, _) => "",
                        (true, 0) => "true",
                        (true, _) => "false",
                    },
                );
            }

            self.nodes.push(id);
            self.node_labels.insert(id, node_label);

            // reversed so the first successor is visited first
            worklist.extend(targets.into_iter().rev());
        }
    }
}

impl<'ast, 'a> Labeller<'ast, NodeId, EdgeId> for Graph<'a> {
    fn graph_id(&'ast self) -> dot::Id<'ast> {
        dot::Id::new(format!("cfg_{}", sanitize(self.function.name().as_ref())))
            .expect("sanitized identifier is valid")
    }

    fn node_id(&'ast self, n: &NodeId) -> dot::Id<'ast> {
        dot::Id::new(format!("n{:x}", n)).expect("hex identifier is valid")
    }

    fn node_label(&'ast self, n: &NodeId) -> dot::LabelText<'ast> {
        let label = self.node_labels.get(n).cloned().unwrap_or("?".to_owned());

        LabelText::EscStr(label.into())
    }

    fn node_shape(&'ast self, _: &NodeId) -> Option<LabelText<'ast>> {
        Some(LabelText::LabelStr("record".into()))
    }

    fn edge_label(&'ast self, e: &EdgeId) -> LabelText<'ast> {
        LabelText::LabelStr(self.edge_labels.get(e).copied().unwrap_or("?").into())
    }
}

impl<'ast, 'a> GraphWalk<'ast, NodeId, EdgeId> for Graph<'a> {
    fn nodes(&'ast self) -> Nodes<'ast, NodeId> {
        (&self.nodes).into()
    }

    fn edges(&'ast self) -> Edges<'ast, EdgeId> {
        (&self.edges).into()
    }

    fn source(&'ast self, edge: &EdgeId) -> NodeId {
        edge.0
    }

    fn target(&'ast self, edge: &EdgeId) -> NodeId {
        edge.1
    }
}

/// Graphviz identifiers are limited to alphanumerics and underscores
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
