//! Front-end program model
//!
//! The parser hands over a reduced view of each function: only the statement
//! shapes that matter for shared-state analysis survive (resource reads and
//! writes, calls, critical blocks and control transfers). Everything else is
//! collapsed into [`Statement::Other`].

use super::span::Span;
use serde::{Deserialize, Serialize};

/// How a declared shared resource may be accessed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    /// Single-value load/store/read-modify-write in atomic form
    Atomic,
    /// Protected only by enclosing critical regions
    RegionScoped,
}

/// Storage width of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccessWidth {
    #[serde(rename = "u8")]
    Bits8,
    #[serde(rename = "u16")]
    Bits16,
    #[serde(rename = "u32")]
    Bits32,
    #[serde(rename = "u64")]
    Bits64,
}

impl AccessWidth {
    pub fn bits(&self) -> u32 {
        match self {
            Self::Bits8 => 8,
            Self::Bits16 => 16,
            Self::Bits32 => 32,
            Self::Bits64 => 64,
        }
    }

    /// C storage type used in emitted code
    pub fn c_type(&self) -> &'static str {
        match self {
            Self::Bits8 => "uint8_t",
            Self::Bits16 => "uint16_t",
            Self::Bits32 => "uint32_t",
            Self::Bits64 => "uint64_t",
        }
    }

    /// Suffix of the exclusive load/store intrinsics (`__LDREXB`, `__LDREXH`, `__LDREXW`)
    pub fn exclusive_suffix(&self) -> Option<&'static str> {
        match self {
            Self::Bits8 => Some("B"),
            Self::Bits16 => Some("H"),
            Self::Bits32 => Some("W"),
            Self::Bits64 => None,
        }
    }
}

impl Default for AccessWidth {
    fn default() -> Self {
        Self::Bits32
    }
}

/// A declared shared storage location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDecl {
    pub name: String,
    pub class: ResourceClass,
    #[serde(default)]
    pub width: AccessWidth,
    #[serde(default)]
    pub span: Span,
}

impl ResourceDecl {
    pub fn new(name: impl Into<String>, class: ResourceClass) -> Self {
        Self {
            name: name.into(),
            class,
            width: AccessWidth::default(),
            span: Span::zero(),
        }
    }

    pub fn atomic(name: impl Into<String>) -> Self {
        Self::new(name, ResourceClass::Atomic)
    }

    pub fn region_scoped(name: impl Into<String>) -> Self {
        Self::new(name, ResourceClass::RegionScoped)
    }

    pub fn with_width(mut self, width: AccessWidth) -> Self {
        self.width = width;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn is_atomic(&self) -> bool {
        self.class == ResourceClass::Atomic
    }
}

/// Call target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Callee {
    /// Statically resolved call by name
    Direct(String),
    /// Call through a function pointer (the expression text is kept for diagnostics)
    Indirect(String),
}

/// Reduced statement stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    Read {
        resource: String,
        #[serde(default)]
        span: Span,
    },
    /// Store into `resource`; the stored value is computed from `depends_on`
    Write {
        resource: String,
        #[serde(default)]
        depends_on: Vec<String>,
        #[serde(default)]
        span: Span,
    },
    /// Explicit atomic compound assignment on a single variable
    AtomicRmw {
        resource: String,
        #[serde(default)]
        span: Span,
    },
    Call {
        callee: Callee,
        #[serde(default)]
        span: Span,
    },
    Critical {
        body: Vec<Statement>,
        #[serde(default)]
        span: Span,
    },
    If {
        then_branch: Vec<Statement>,
        #[serde(default)]
        else_branch: Vec<Statement>,
        #[serde(default)]
        span: Span,
    },
    Loop {
        body: Vec<Statement>,
        #[serde(default)]
        span: Span,
    },
    Block {
        body: Vec<Statement>,
        #[serde(default)]
        span: Span,
    },
    Return {
        #[serde(default)]
        span: Span,
    },
    Break {
        #[serde(default)]
        span: Span,
    },
    Continue {
        #[serde(default)]
        span: Span,
    },
    Other {
        #[serde(default)]
        span: Span,
    },
}

impl Statement {
    pub fn read(resource: impl Into<String>) -> Self {
        Self::Read {
            resource: resource.into(),
            span: Span::zero(),
        }
    }

    pub fn write(resource: impl Into<String>) -> Self {
        Self::Write {
            resource: resource.into(),
            depends_on: Vec::new(),
            span: Span::zero(),
        }
    }

    /// `target <- f(deps...)`
    pub fn write_from<I, S>(resource: impl Into<String>, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Write {
            resource: resource.into(),
            depends_on: depends_on.into_iter().map(Into::into).collect(),
            span: Span::zero(),
        }
    }

    pub fn atomic_rmw(resource: impl Into<String>) -> Self {
        Self::AtomicRmw {
            resource: resource.into(),
            span: Span::zero(),
        }
    }

    pub fn call(callee: impl Into<String>) -> Self {
        Self::Call {
            callee: Callee::Direct(callee.into()),
            span: Span::zero(),
        }
    }

    pub fn call_indirect(expression: impl Into<String>) -> Self {
        Self::Call {
            callee: Callee::Indirect(expression.into()),
            span: Span::zero(),
        }
    }

    pub fn critical(body: Vec<Statement>) -> Self {
        Self::Critical {
            body,
            span: Span::zero(),
        }
    }

    pub fn if_else(then_branch: Vec<Statement>, else_branch: Vec<Statement>) -> Self {
        Self::If {
            then_branch,
            else_branch,
            span: Span::zero(),
        }
    }

    pub fn looped(body: Vec<Statement>) -> Self {
        Self::Loop {
            body,
            span: Span::zero(),
        }
    }

    pub fn block(body: Vec<Statement>) -> Self {
        Self::Block {
            body,
            span: Span::zero(),
        }
    }

    pub fn ret() -> Self {
        Self::Return { span: Span::zero() }
    }

    pub fn brk() -> Self {
        Self::Break { span: Span::zero() }
    }

    pub fn cont() -> Self {
        Self::Continue { span: Span::zero() }
    }

    pub fn other() -> Self {
        Self::Other { span: Span::zero() }
    }

    /// Replace the statement's span
    pub fn at(mut self, new_span: Span) -> Self {
        *self.span_mut() = new_span;
        self
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Read { span, .. }
            | Self::Write { span, .. }
            | Self::AtomicRmw { span, .. }
            | Self::Call { span, .. }
            | Self::Critical { span, .. }
            | Self::If { span, .. }
            | Self::Loop { span, .. }
            | Self::Block { span, .. }
            | Self::Return { span }
            | Self::Break { span }
            | Self::Continue { span }
            | Self::Other { span } => *span,
        }
    }

    fn span_mut(&mut self) -> &mut Span {
        match self {
            Self::Read { span, .. }
            | Self::Write { span, .. }
            | Self::AtomicRmw { span, .. }
            | Self::Call { span, .. }
            | Self::Critical { span, .. }
            | Self::If { span, .. }
            | Self::Loop { span, .. }
            | Self::Block { span, .. }
            | Self::Return { span }
            | Self::Break { span }
            | Self::Continue { span }
            | Self::Other { span } => span,
        }
    }

    /// Nested statement blocks, in source order
    pub fn child_blocks(&self) -> Vec<&[Statement]> {
        match self {
            Self::Critical { body, .. } | Self::Loop { body, .. } | Self::Block { body, .. } => {
                vec![body.as_slice()]
            }
            Self::If {
                then_branch,
                else_branch,
                ..
            } => vec![then_branch.as_slice(), else_branch.as_slice()],
            _ => Vec::new(),
        }
    }
}

/// Function body handed over by the front-end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub body: Vec<Statement>,
    /// Address escapes into a function pointer somewhere in the program
    #[serde(default)]
    pub address_taken: bool,
    #[serde(default)]
    pub span: Span,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: Vec::new(),
            address_taken: false,
            span: Span::zero(),
        }
    }

    pub fn with_body(mut self, body: Vec<Statement>) -> Self {
        self.body = body;
        self
    }

    pub fn with_address_taken(mut self) -> Self {
        self.address_taken = true;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// Static call edge (`caller -> callee`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: String,
    pub callee: String,
}

impl CallEdge {
    pub fn new(caller: impl Into<String>, callee: impl Into<String>) -> Self {
        Self {
            caller: caller.into(),
            callee: callee.into(),
        }
    }
}

/// Whole program as seen by the concurrency verifier
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Program {
    pub file_path: String,
    #[serde(default)]
    pub resources: Vec<ResourceDecl>,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
    /// Edges known to the front-end that are not visible as `Call` statements
    #[serde(default)]
    pub extra_call_edges: Vec<CallEdge>,
}

impl Program {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    /// Parse the front-end's JSON handoff
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn with_resource(mut self, resource: ResourceDecl) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_function(mut self, function: FunctionDecl) -> Self {
        self.functions.push(function);
        self
    }

    pub fn with_call_edge(mut self, edge: CallEdge) -> Self {
        self.extra_call_edges.push(edge);
        self
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// First declaration of a resource (duplicates are reported separately)
    pub fn resource(&self, name: &str) -> Option<&ResourceDecl> {
        self.resources.iter().find(|r| r.name == name)
    }
}
