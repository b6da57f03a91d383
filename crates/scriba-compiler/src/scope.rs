//! Scope chains.
//!
//! Scopes form a flat arena of nodes with parent indices; lookup walks the
//! chain upward on a miss. `using` directives and declarations inject extra
//! visible names into a node without altering the chain.

use indexmap::IndexMap;

use crate::symbols::{ClassId, EnumId, NamespaceId, ScriptId, Symbol, TemplateArgument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Category of a function-local scope; drives where `break`, `continue`
/// and scope-exit destruction target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionScopeCategory {
    FunctionArguments,
    FunctionBody,
    IfBody,
    WhileBody,
    ForInit,
    ForBody,
    CompoundStatement,
}

impl FunctionScopeCategory {
    pub fn is_loop(self) -> bool {
        matches!(
            self,
            FunctionScopeCategory::WhileBody | FunctionScopeCategory::ForBody
        )
    }
}

#[derive(Debug, Clone)]
pub enum ScopeKind {
    RootNamespace,
    Namespace(NamespaceId),
    Class(ClassId),
    Enum(EnumId),
    Script(ScriptId),
    /// Instantiation scope mapping template-parameter names to arguments.
    TemplateArguments(IndexMap<String, TemplateArgument>),
    /// A function-local scope; its variables live on the compiler's stack
    /// starting at `stack_pointer`.
    FunctionLocal {
        category: FunctionScopeCategory,
        stack_pointer: usize,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ScopeInjections {
    /// Namespaces made visible by `using namespace`.
    pub namespaces: Vec<NamespaceId>,
    /// Single names made visible by `using a::b`.
    pub names: Vec<(String, Symbol)>,
    /// `namespace x = y` aliases.
    pub namespace_aliases: IndexMap<String, NamespaceId>,
}

#[derive(Debug, Clone)]
pub struct ScopeNode {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    pub injections: ScopeInjections,
}

/// The scope arena of one compilation session.
#[derive(Debug, Default)]
pub struct Scopes {
    nodes: Vec<ScopeNode>,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.nodes.len() as u32);
        self.nodes.push(ScopeNode {
            parent,
            kind,
            injections: ScopeInjections::default(),
        });
        id
    }

    pub fn node(&self, id: ScopeId) -> &ScopeNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: ScopeId) -> &mut ScopeNode {
        &mut self.nodes[id.index()]
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.node(id).parent
    }

    /// The chain from `id` to the root, innermost first.
    pub fn chain(&self, id: ScopeId) -> Vec<ScopeId> {
        let mut out = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            out.push(parent);
            current = parent;
        }
        out
    }

    /// The class this scope (or an enclosing one) belongs to.
    pub fn enclosing_class(&self, id: ScopeId) -> Option<ClassId> {
        self.chain(id).into_iter().find_map(|s| match self.node(s).kind {
            ScopeKind::Class(c) => Some(c),
            _ => None,
        })
    }

    /// The namespace this scope (or an enclosing one) belongs to.
    pub fn enclosing_namespace(&self, id: ScopeId, root: NamespaceId) -> NamespaceId {
        for s in self.chain(id) {
            match self.node(s).kind {
                ScopeKind::Namespace(n) => return n,
                ScopeKind::RootNamespace => return root,
                _ => {}
            }
        }
        root
    }

    /// Innermost template-argument binding for `name`.
    pub fn template_argument(&self, id: ScopeId, name: &str) -> Option<&TemplateArgument> {
        for s in self.chain(id) {
            if let ScopeKind::TemplateArguments(map) = &self.node(s).kind
                && let Some(arg) = map.get(name)
            {
                return Some(arg);
            }
        }
        None
    }
}
